use std::collections::HashMap;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use parking_lot::RwLock;
use password_hash::{PasswordHash, SaltString};
use thiserror::Error;
use crate::tprintln;

use super::principal::{Attrs, Principal};
use super::session::{Session, SessionManager};

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Token or credentials are absent, invalid, or expired with no refresh
    /// path.
    #[error("unauthenticated")]
    Unauthenticated,
    /// The provider could not be reached or answered abnormally. Callers must
    /// fail closed, never surface this as a privilege.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// A token minted during validation that must be written back to the client's
/// credential store. `max_age_secs` of None means the caller's default
/// lifetime applies.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub max_age_secs: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub principal: Principal,
    pub reissued: Option<IssuedToken>,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub ip: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub session: Session,
}

/// Port to whatever owns authentication tokens. The core never inspects token
/// contents, only hands them over for validation.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ProviderError>;

    /// Validate a token and, when it is close to expiry, transparently reissue
    /// it. A reissued token must reach the client's credential store.
    async fn validate_and_refresh(&self, token: &str) -> Result<RefreshOutcome, ProviderError>;

    async fn invalidate(&self, token: &str) -> Result<(), ProviderError>;

    /// Substrings the provider embeds in its cookie names. Sign-out sweeps
    /// every request cookie whose name contains one of these,
    /// case-insensitively, so renamed provider cookies still get cleared.
    fn cookie_markers(&self) -> &[&'static str];
}

struct Credential {
    member_id: String,
    email: String,
    phc: String,
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow::anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

/// Argon2-backed provider over an in-memory credential table, sessions via
/// `SessionManager`.
pub struct LocalIdentityProvider {
    sm: SessionManager,
    // keyed by lowercased email
    users: RwLock<HashMap<String, Credential>>,
}

impl LocalIdentityProvider {
    pub fn new(sm: SessionManager) -> Self {
        Self { sm, users: RwLock::new(HashMap::new()) }
    }

    /// Register a member credential; replaces any existing entry for the same
    /// email. Returns the member id.
    pub fn register(&self, email: &str, password: &str) -> anyhow::Result<String> {
        let phc = hash_password(password)?;
        let member_id = uuid::Uuid::new_v4().to_string();
        let cred = Credential { member_id: member_id.clone(), email: email.to_string(), phc };
        self.users.write().insert(email.to_lowercase(), cred);
        Ok(member_id)
    }

    /// Seed the bootstrap account on first start; a no-op when the email is
    /// already registered.
    pub fn ensure_bootstrap_account(&self, email: &str, password: &str) -> anyhow::Result<()> {
        if self.users.read().contains_key(&email.to_lowercase()) { return Ok(()); }
        let member_id = self.register(email, password)?;
        tprintln!("auth.bootstrap email={} member={}", email, member_id);
        Ok(())
    }

    pub fn session_manager(&self) -> &SessionManager { &self.sm }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn login(&self, req: &LoginRequest) -> Result<LoginResponse, ProviderError> {
        let principal = {
            let users = self.users.read();
            let Some(cred) = users.get(&req.email.to_lowercase()) else {
                return Err(ProviderError::Unauthenticated);
            };
            if !verify_password(&cred.phc, &req.password) {
                return Err(ProviderError::Unauthenticated);
            }
            Principal {
                member_id: cred.member_id.clone(),
                email: cred.email.clone(),
                attrs: Attrs { ip: req.ip.clone(), ..Default::default() },
            }
        };
        let session = self.sm.issue(principal);
        tprintln!("auth.login email={} sid={}", req.email, session.session_id);
        Ok(LoginResponse { session })
    }

    async fn validate_and_refresh(&self, token: &str) -> Result<RefreshOutcome, ProviderError> {
        let Some(principal) = self.sm.validate(token) else {
            return Err(ProviderError::Unauthenticated);
        };
        let reissued = self.sm.refresh_if_stale(token).map(|sess| IssuedToken {
            token: sess.token,
            max_age_secs: Some(self.sm.ttl().as_secs() as i64),
        });
        Ok(RefreshOutcome { principal, reissued })
    }

    async fn invalidate(&self, token: &str) -> Result<(), ProviderError> {
        self.sm.logout(token);
        Ok(())
    }

    fn cookie_markers(&self) -> &[&'static str] {
        &["huddle_session", "-auth-token"]
    }
}

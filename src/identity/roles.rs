//! Effective privilege resolution.
//!
//! Precedence is strict: configured owner email first (short-circuits, no
//! lookups), then a live temporary-admin grant, then plain membership. The
//! result is derived fresh on every call; an expired or revoked grant takes
//! effect on the very next request. There is deliberately no way to demote
//! the owner through the grant table.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::directory::MemberDirectory;
use crate::error::AppError;
use crate::messages;
use super::principal::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Owner,
    /// Elevated until the stored expiry; carries the expiry so callers can
    /// surface it.
    TemporaryAdmin(DateTime<Utc>),
    Member,
    Guest,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::TemporaryAdmin(_) => "temporary_admin",
            Role::Member => "member",
            Role::Guest => "guest",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Owner | Role::TemporaryAdmin(_))
    }
}

fn is_owner_email(owner_email: &str, email: &str) -> bool {
    email.trim().eq_ignore_ascii_case(owner_email.trim())
}

/// Resolve effective privilege at an explicit instant. Directory errors
/// resolve to Member, never to an elevated role.
pub async fn resolve_role_at(
    dir: &dyn MemberDirectory,
    owner_email: &str,
    email: Option<&str>,
    now: DateTime<Utc>,
) -> Role {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Role::Guest;
    };
    if is_owner_email(owner_email, email) {
        return Role::Owner;
    }
    match dir.temporary_admin_grant(&email.to_lowercase()).await {
        Ok(Some(grant)) => match grant.expires_at {
            Some(expires_at) if expires_at > now => Role::TemporaryAdmin(expires_at),
            _ => Role::Member,
        },
        Ok(None) => Role::Member,
        Err(e) => {
            warn!(target: "roles", error = %e, "grant lookup failed; resolving as member");
            Role::Member
        }
    }
}

pub async fn resolve_role(dir: &dyn MemberDirectory, owner_email: &str, email: Option<&str>) -> Role {
    resolve_role_at(dir, owner_email, email, Utc::now()).await
}

/// Store-free variant for rendering-time trust decisions. Conservative: it
/// can only ever answer Owner, Member or Guest, never TemporaryAdmin, and
/// must not gate privileged mutations — use the full resolver for those.
pub fn resolve_role_local(owner_email: &str, email: Option<&str>) -> Role {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Role::Guest;
    };
    if is_owner_email(owner_email, email) { Role::Owner } else { Role::Member }
}

/// Write the elevated role label through to the directory, but only after the
/// resolver independently confirms owner status. The stored flag is a
/// convenience mirror, never the source of truth.
pub async fn claim_owner_role(
    dir: &dyn MemberDirectory,
    owner_email: &str,
    who: &Principal,
) -> Result<(), AppError> {
    match resolve_role(dir, owner_email, Some(&who.email)).await {
        Role::Owner => dir.set_owner_role_flag(&who.member_id).await.map_err(|e| {
            AppError::transient("role_flag_write_failed", messages::classify_str(&e.to_string()))
        }),
        _ => Err(AppError::forbidden("not_owner", "You don't have permission to do that.")),
    }
}

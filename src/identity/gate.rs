//! Per-request session gate: validates/refreshes the session credential,
//! classifies the path and decides allow vs redirect. Never errors — every
//! request gets a decision, and provider outages degrade to "no identity".

use axum::http::HeaderMap;
use tracing::warn;

use super::principal::Principal;
use super::provider::{IdentityProvider, ProviderError};
use super::routes::{classify_path, RouteClass};

/// Name of the session credential cookie.
pub const SESSION_COOKIE: &str = "huddle_session";

/// Cookie names from earlier releases, always swept on sign-out.
pub const LEGACY_COOKIES: [&str; 2] = ["huddle-auth-token", "huddle-refresh-token"];

/// Applied to reissued credentials when the provider does not specify a
/// lifetime: 7 days.
pub const DEFAULT_COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Continue,
    RedirectTo(&'static str),
}

/// One pending write to the client's credential store. Rendered with
/// HttpOnly, SameSite=Lax, Path=/ and Secure when the deployment asks for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieWrite {
    pub name: String,
    pub value: String,
    pub max_age_secs: Option<i64>,
    pub remove: bool,
}

impl CookieWrite {
    pub fn set(name: &str, value: &str, max_age_secs: i64) -> Self {
        Self { name: name.to_string(), value: value.to_string(), max_age_secs: Some(max_age_secs), remove: false }
    }

    pub fn clear(name: &str) -> Self {
        Self { name: name.to_string(), value: "deleted".to_string(), max_age_secs: None, remove: true }
    }

    /// Render as a Set-Cookie header value.
    pub fn header_value(&self, secure: bool) -> String {
        let secure_attr = if secure { " Secure;" } else { "" };
        if self.remove {
            format!(
                "{}=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly;{} SameSite=Lax; Path=/",
                self.name, secure_attr
            )
        } else {
            format!(
                "{}={}; Max-Age={}; HttpOnly;{} SameSite=Lax; Path=/",
                self.name,
                self.value,
                self.max_age_secs.unwrap_or(DEFAULT_COOKIE_MAX_AGE_SECS),
                secure_attr
            )
        }
    }
}

/// Later writes for the same cookie name replace earlier ones, so each name
/// reaches the response exactly once.
pub fn dedupe_writes(writes: Vec<CookieWrite>) -> Vec<CookieWrite> {
    let mut out: Vec<CookieWrite> = Vec::with_capacity(writes.len());
    for w in writes {
        if let Some(existing) = out.iter_mut().find(|e| e.name == w.name) {
            *existing = w;
        } else {
            out.push(w);
        }
    }
    out
}

#[derive(Debug)]
pub struct GateOutcome {
    pub decision: GateDecision,
    pub principal: Option<Principal>,
    pub cookie_writes: Vec<CookieWrite>,
}

/// Screen one request. Cookie writes in the outcome apply to the outgoing
/// response in both branches — a reissued token survives a redirect.
pub async fn screen(provider: &dyn IdentityProvider, token: Option<&str>, path: &str) -> GateOutcome {
    let mut cookie_writes = Vec::new();
    let principal = match token {
        None => None,
        Some(tok) => match provider.validate_and_refresh(tok).await {
            Ok(out) => {
                if let Some(reissued) = out.reissued {
                    cookie_writes.push(CookieWrite::set(
                        SESSION_COOKIE,
                        &reissued.token,
                        reissued.max_age_secs.unwrap_or(DEFAULT_COOKIE_MAX_AGE_SECS),
                    ));
                }
                Some(out.principal)
            }
            Err(ProviderError::Unauthenticated) => None,
            Err(ProviderError::Unavailable(msg)) => {
                warn!(target: "gate", error = %msg, "identity provider unreachable; treating request as anonymous");
                None
            }
        },
    };

    let decision = match (classify_path(path), principal.is_some()) {
        (RouteClass::Protected, false) => GateDecision::RedirectTo("/login"),
        (RouteClass::AuthOnly, true) => GateDecision::RedirectTo("/dashboard"),
        _ => GateDecision::Continue,
    };

    GateOutcome { decision, principal, cookie_writes: dedupe_writes(cookie_writes) }
}

/// Invalidate the session and compute the cookie sweep: the session cookie,
/// both legacy names, and every request cookie whose name contains one of the
/// provider's markers (case-insensitive). A provider failure is logged and
/// the sweep still happens — no session artifact may survive client-side.
pub async fn sign_out(
    provider: &dyn IdentityProvider,
    token: Option<&str>,
    request_cookie_names: &[String],
) -> Vec<CookieWrite> {
    if let Some(tok) = token {
        if let Err(e) = provider.invalidate(tok).await {
            warn!(target: "gate", error = %e, "session invalidation failed during sign-out");
        }
    }

    let mut writes = vec![CookieWrite::clear(SESSION_COOKIE)];
    for legacy in LEGACY_COOKIES {
        writes.push(CookieWrite::clear(legacy));
    }
    let markers: Vec<String> = provider.cookie_markers().iter().map(|m| m.to_lowercase()).collect();
    for name in request_cookie_names {
        let lower = name.to_lowercase();
        if markers.iter().any(|m| lower.contains(m.as_str())) {
            writes.push(CookieWrite::clear(name));
        }
    }
    dedupe_writes(writes)
}

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie = headers.get("cookie").or_else(|| headers.get("Cookie"))?;
    let s = cookie.to_str().ok()?;
    for part in s.split(';') {
        let p = part.trim();
        if let Some(eq) = p.find('=') {
            let (k, v) = p.split_at(eq);
            if k == name { return Some(v[1..].to_string()); }
        }
    }
    None
}

pub fn cookie_names(headers: &HeaderMap) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(cookie) = headers.get("cookie").or_else(|| headers.get("Cookie")) {
        if let Ok(s) = cookie.to_str() {
            for part in s.split(';') {
                let p = part.trim();
                if let Some(eq) = p.find('=') {
                    names.push(p[..eq].to_string());
                }
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_render_includes_attributes() {
        let w = CookieWrite::set(SESSION_COOKIE, "tok123", 604800);
        let v = w.header_value(true);
        assert!(v.starts_with("huddle_session=tok123; Max-Age=604800;"));
        assert!(v.contains("HttpOnly"));
        assert!(v.contains("Secure"));
        assert!(v.contains("SameSite=Lax"));
        assert!(v.contains("Path=/"));

        let dev = w.header_value(false);
        assert!(!dev.contains("Secure"));
    }

    #[test]
    fn cookie_clear_expires_in_the_past() {
        let v = CookieWrite::clear("huddle-auth-token").header_value(true);
        assert!(v.contains("Expires=Thu, 01 Jan 1970"));
        assert!(v.starts_with("huddle-auth-token=deleted;"));
    }

    #[test]
    fn later_writes_overwrite_earlier_ones() {
        let writes = vec![
            CookieWrite::set(SESSION_COOKIE, "old", 60),
            CookieWrite::clear("other"),
            CookieWrite::set(SESSION_COOKIE, "new", 60),
        ];
        let deduped = dedupe_writes(writes);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].value, "new");
        assert_eq!(deduped[1].name, "other");
    }

    #[test]
    fn parse_cookie_picks_the_named_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("a=1; huddle_session=tok; b=2"),
        );
        assert_eq!(parse_cookie(&headers, SESSION_COOKIE).as_deref(), Some("tok"));
        assert_eq!(parse_cookie(&headers, "missing"), None);
        assert_eq!(cookie_names(&headers), vec!["a", "huddle_session", "b"]);
    }
}

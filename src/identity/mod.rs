//! Central identity, session and access-control core for Huddle.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod routes;
mod roles;
mod gate;

pub use principal::{Principal, Attrs};
pub use session::{Session, SessionToken, SessionManager};
pub use provider::{
    IdentityProvider, LocalIdentityProvider, LoginRequest, LoginResponse, ProviderError,
    IssuedToken, RefreshOutcome,
};
pub use routes::{RouteClass, ROUTE_TABLE, classify_path};
pub use roles::{Role, resolve_role, resolve_role_at, resolve_role_local, claim_owner_role};
pub use gate::{
    GateDecision, GateOutcome, CookieWrite, screen, sign_out, parse_cookie, cookie_names,
    SESSION_COOKIE, LEGACY_COOKIES, DEFAULT_COOKIE_MAX_AGE_SECS,
};

//!
//! Huddle HTTP server
//! ------------------
//! Axum-based HTTP API for the membership and event-scheduling app.
//!
//! Responsibilities:
//! - Session gate applied to every request at the network edge: credential
//!   refresh, route classification, allow/redirect decisions.
//! - Login/logout endpoints backed by the identity provider.
//! - Effective-role reporting and the owner-claim write-through.
//! - Thin gated endpoints for the app surfaces (dashboard, members, events,
//!   profile, tools).
//!
//! Handlers never put raw upstream error text in a response body; everything
//! user-facing goes through `crate::messages` first.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::audit::AuditSink;
use crate::config::AppConfig;
use crate::directory::{MemberDirectory, MemoryDirectory};
use crate::error::AppError;
use crate::identity::{
    self, CookieWrite, GateDecision, IdentityProvider, LocalIdentityProvider, LoginRequest,
    Principal, ProviderError, SessionManager, SESSION_COOKIE,
};
use crate::messages;

/// Shared server state injected into all handlers. Ports are trait objects so
/// tests can swap in failing collaborators.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn IdentityProvider>,
    pub directory: Arc<dyn MemberDirectory>,
    pub audit: AuditSink,
    pub cfg: Arc<AppConfig>,
}

/// Mount all routes with the session gate wrapped around them.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "huddle ok" }))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session_info))
        .route("/dashboard", get(page_dashboard))
        .route("/members", get(page_members))
        .route("/events/{id}", get(event_detail))
        .route("/profile", get(page_profile))
        .route("/profile/claim-owner", post(claim_owner))
        .route("/tools", get(page_tools))
        .layer(middleware::from_fn_with_state(state.clone(), session_gate))
        .with_state(state)
}

/// Start the server: seed the bootstrap owner account, wire the audit drain
/// and serve until shutdown.
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let provider = Arc::new(LocalIdentityProvider::new(SessionManager::new(cfg.session_ttl)));
    provider.ensure_bootstrap_account(&cfg.owner_email, &cfg.bootstrap_password)?;

    let state = AppState {
        provider,
        directory: Arc::new(MemoryDirectory::new()),
        audit: AuditSink::spawn(),
        cfg: Arc::new(cfg.clone()),
    };

    let app = router(state);
    let addr: SocketAddr = format!("0.0.0.0:{}", cfg.http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Convenience entry point using environment configuration.
pub async fn run() -> anyhow::Result<()> {
    run_with_config(AppConfig::from_env()).await
}

/// The network-edge interception point. Every request gets a decision;
/// credential writes computed here reach the response even on redirects.
async fn session_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = identity::parse_cookie(req.headers(), SESSION_COOKIE);
    let outcome = identity::screen(&*state.provider, token.as_deref(), req.uri().path()).await;

    let mut response = match outcome.decision {
        GateDecision::Continue => {
            if let Some(principal) = outcome.principal {
                req.extensions_mut().insert(principal);
            }
            next.run(req).await
        }
        GateDecision::RedirectTo(path) => redirect(path),
    };

    merge_cookie_writes(response.headers_mut(), &outcome.cookie_writes, state.cfg.secure_cookies);
    response
}

fn redirect(path: &str) -> Response {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str(path) {
        headers.insert(header::LOCATION, v);
    }
    (StatusCode::TEMPORARY_REDIRECT, headers).into_response()
}

/// Append cookie writes to a response, skipping names a handler already wrote:
/// handler writes happened later and win.
fn merge_cookie_writes(headers: &mut HeaderMap, writes: &[CookieWrite], secure: bool) {
    let written: Vec<String> = headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|s| s.split('=').next().map(|n| n.to_string()))
        .collect();
    for w in writes {
        if written.iter().any(|n| n == &w.name) {
            continue;
        }
        if let Ok(v) = HeaderValue::from_str(&w.header_value(secure)) {
            headers.append(header::SET_COOKIE, v);
        }
    }
}

fn set_cookie_headers(writes: &[CookieWrite], secure: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    for w in writes {
        if let Ok(v) = HeaderValue::from_str(&w.header_value(secure)) {
            headers.append(header::SET_COOKIE, v);
        }
    }
    headers
}

fn app_error_response(app: &AppError) -> Response {
    let status = StatusCode::from_u16(app.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"status": "error", "code": app.code_str(), "message": app.message()}))).into_response()
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    email: String,
    password: String,
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginPayload>) -> Response {
    let req = LoginRequest { email: payload.email.clone(), password: payload.password, ip: None };
    match state.provider.login(&req).await {
        Ok(resp) => {
            let ttl_secs = state.cfg.session_ttl.as_secs() as i64;
            let writes = [CookieWrite::set(SESSION_COOKIE, &resp.session.token, ttl_secs)];
            let headers = set_cookie_headers(&writes, state.cfg.secure_cookies);
            state.audit.record(Some(&resp.session.principal.member_id), "login", payload.email);
            (StatusCode::OK, headers, Json(json!({"status": "ok"}))).into_response()
        }
        Err(ProviderError::Unauthenticated) => {
            let app = AppError::unauthenticated("invalid_credentials", messages::classify_str("invalid login credentials"));
            app_error_response(&app)
        }
        Err(ProviderError::Unavailable(msg)) => {
            error!("login provider error: {msg}");
            let app = AppError::transient("provider_unavailable", messages::classify_str(&msg));
            app_error_response(&app)
        }
    }
}

/// Sign-out contract: invalidate the session, then redirect to /login while
/// clearing every credential-store entry the provider could have written.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let token = identity::parse_cookie(&headers, SESSION_COOKIE);
    let names = identity::cookie_names(&headers);
    let writes = identity::sign_out(&*state.provider, token.as_deref(), &names).await;

    state.audit.record(None, "sign_out", "session cleared");

    let mut out = set_cookie_headers(&writes, state.cfg.secure_cookies);
    if let Ok(v) = HeaderValue::from_str("/login") {
        out.insert(header::LOCATION, v);
    }
    (StatusCode::TEMPORARY_REDIRECT, out).into_response()
}

/// Who am I: principal plus effective role (full resolver) and the advisory
/// store-free role for rendering decisions.
async fn session_info(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
) -> Response {
    match principal {
        Some(Extension(p)) => {
            let role = identity::resolve_role(&*state.directory, &state.cfg.owner_email, Some(&p.email)).await;
            let advisory = identity::resolve_role_local(&state.cfg.owner_email, Some(&p.email));
            let expires_at = match role {
                identity::Role::TemporaryAdmin(at) => Some(at.to_rfc3339()),
                _ => None,
            };
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "member_id": p.member_id,
                    "email": p.email,
                    "role": role.label(),
                    "role_advisory": advisory.label(),
                    "admin_until": expires_at,
                })),
            )
                .into_response()
        }
        None => (
            StatusCode::OK,
            Json(json!({"status": "ok", "role": identity::Role::Guest.label()})),
        )
            .into_response(),
    }
}

async fn claim_owner(
    State(state): State<AppState>,
    principal: Option<Extension<Principal>>,
) -> Response {
    let Some(Extension(p)) = principal else {
        let app = AppError::unauthenticated("no_session", messages::classify_str("unauthenticated"));
        return app_error_response(&app);
    };
    match identity::claim_owner_role(&*state.directory, &state.cfg.owner_email, &p).await {
        Ok(()) => {
            state.audit.record(Some(&p.member_id), "claim_owner", p.email.clone());
            (StatusCode::OK, Json(json!({"status": "ok", "role": "owner"}))).into_response()
        }
        Err(app) => app_error_response(&app),
    }
}

async fn page_dashboard(principal: Option<Extension<Principal>>) -> Response {
    page("dashboard", principal)
}

async fn page_members(principal: Option<Extension<Principal>>) -> Response {
    page("members", principal)
}

async fn page_profile(principal: Option<Extension<Principal>>) -> Response {
    page("profile", principal)
}

async fn page_tools(principal: Option<Extension<Principal>>) -> Response {
    page("tools", principal)
}

async fn event_detail(Path(id): Path<String>, principal: Option<Extension<Principal>>) -> Response {
    match principal {
        Some(Extension(p)) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "event": id, "viewer": p.member_id})),
        )
            .into_response(),
        None => app_error_response(&AppError::unauthenticated(
            "no_session",
            messages::classify_str("unauthenticated"),
        )),
    }
}

/// Gated pages answer with a small acknowledgement; the gate guarantees a
/// principal is present on Protected paths.
fn page(name: &'static str, principal: Option<Extension<Principal>>) -> Response {
    match principal {
        Some(Extension(p)) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "page": name, "viewer": p.member_id})),
        )
            .into_response(),
        None => app_error_response(&AppError::unauthenticated(
            "no_session",
            messages::classify_str("unauthenticated"),
        )),
    }
}

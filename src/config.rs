//! Environment-driven configuration. Every value is injected from here —
//! nothing in the core reads the environment or hardcodes the owner identity.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// The single permanently privileged identity, compared
    /// case-insensitively.
    pub owner_email: String,
    pub http_port: u16,
    pub session_ttl: Duration,
    /// Mark session cookies Secure. On for any real deployment; off for
    /// plain-HTTP local development.
    pub secure_cookies: bool,
    /// Seed password for the bootstrap owner account.
    pub bootstrap_password: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let owner_email = std::env::var("HUDDLE_OWNER_EMAIL")
            .unwrap_or_else(|_| "owner@huddle.local".to_string());
        let http_port = std::env::var("HUDDLE_HTTP_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(7878);
        let session_ttl_secs = std::env::var("HUDDLE_SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(7 * 24 * 3600);
        let secure_cookies = std::env::var("HUDDLE_SECURE_COOKIES")
            .map(|s| s != "false" && s != "0")
            .unwrap_or(true);
        let bootstrap_password = std::env::var("HUDDLE_ADMIN_PASSWORD")
            .unwrap_or_else(|_| "huddle".to_string());
        Self {
            owner_email,
            http_port,
            session_ttl: Duration::from_secs(session_ttl_secs),
            secure_cookies,
            bootstrap_password,
        }
    }
}

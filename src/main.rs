use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let cfg = huddle::config::AppConfig::from_env();
    info!(
        target: "huddle",
        "Huddle starting: RUST_LOG='{}', http_port={}, owner_email='{}', secure_cookies={}",
        rust_log, cfg.http_port, cfg.owner_email, cfg.secure_cookies
    );

    huddle::server::run_with_config(cfg).await
}

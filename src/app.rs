use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap::bootstrap;
use crate::infrastructure::config::AppConfig;
use crate::interfaces::http::start_server;

/// Load configuration, wire the backend and serve HTTP until shutdown.
pub async fn run() -> std::io::Result<()> {
    let config = AppConfig::load().map_err(|err| {
        // Subscriber is not up yet.
        eprintln!("{err}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
    })?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let state = bootstrap(&config).await.map_err(|err| {
        error!(error = %err, "Failed to bootstrap backend");
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    })?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        "HTTP server starting"
    );
    start_server(state, &config.server.host, config.server.port)?.await
}

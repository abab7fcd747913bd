//! presence-relay server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use presence_relay::app_state::AppState;
use presence_relay::auth::JwtAuthority;
use presence_relay::config::RelayConfig;
use presence_relay::directory::{Directory, InMemoryDirectory, PostgresDirectory};
use presence_relay::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    // Load configuration
    let config = RelayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, ?config, "starting presence-relay");

    // Build directory
    let directory: Arc<dyn Directory> = if config.persistence_enabled {
        Arc::new(PostgresDirectory::connect(&config).await?)
    } else {
        tracing::info!("persistence disabled, using in-memory directory");
        Arc::new(InMemoryDirectory::new())
    };

    // Build application state
    let auth = Arc::new(JwtAuthority::new(
        config.jwt_secret.as_bytes(),
        config.jwt_expiration_hours,
    ));
    let app_state = AppState::new(directory, auth, config.outbound_queue_capacity);

    // Build router
    let app = server::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    server::serve(listener, app).await?;

    Ok(())
}

//! Relay Web Server - Starling webhook receiver.
//!
//! This binary provides a thin web server that:
//! - Receives Starling webhooks and verifies their signatures
//! - Publishes the raw payload to a Redis pub/sub channel
//! - Reports Redis liveness on `/health`

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use relay::util::{init_logging, shutdown_signal};
use relay::{router, AppState, Config, RedisBus, Verifier};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        redis_addr = %config.redis_addr,
        redis_channel = %config.redis_channel,
        verification_mode = ?config.verification_mode,
        webhook_secret_configured = config.webhook_secret.is_some(),
        "config_loaded"
    );
    config.warn_insecure();

    // Unusable key material must stop the process before it serves traffic
    let verifier = Verifier::from_config(config.verification_mode, config.webhook_secret.as_deref())
        .context("Failed to initialise webhook verification key")?;
    info!(
        mode = verifier.mode_name(),
        enabled = verifier.is_enabled(),
        "verifier_ready"
    );

    let bus = RedisBus::connect(
        &config.redis_addr,
        config.redis_password.as_deref(),
        config.connect_timeout(),
    )
    .await
    .context("Failed to connect to Redis")?;

    let state = AppState::new(&config, verifier, Arc::new(bus.clone()));
    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // In-flight requests finish (each bounded by the read and publish
    // timeouts) before serve returns
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("web_server_shutting_down");
        })
        .await
        .context("Server error")?;

    bus.close();

    info!("web_server_shutdown_complete");

    Ok(())
}

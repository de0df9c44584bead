//! Relay Subscriber - prints events published by the web server.
//!
//! Subscribes to the configured Redis channel and logs every message as it
//! arrives. Intended for local testing of the bridge.

use anyhow::{Context, Result};
use futures::StreamExt;
use tracing::{info, warn};

use relay::bus::redis_bus::connection_url;
use relay::util::{init_logging, shutdown_signal};
use relay::{Config, WebhookEvent};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::from_env();

    let url = connection_url(&config.redis_addr, config.redis_password.as_deref())
        .context("Invalid Redis address")?;
    let client = redis::Client::open(url.as_str()).context("Invalid Redis address")?;

    let mut pubsub = tokio::time::timeout(config.connect_timeout(), client.get_async_pubsub())
        .await
        .context("Timed out connecting to Redis")?
        .context("Failed to connect to Redis")?;

    info!(redis_addr = %config.redis_addr, "redis_connected");

    pubsub
        .subscribe(config.redis_channel.as_str())
        .await
        .context("Failed to subscribe")?;

    info!(channel = %config.redis_channel, "subscriber_waiting_for_messages");

    let messages = pubsub.on_message();
    tokio::pin!(messages);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("subscriber_stopping");
                break;
            }
            message = messages.next() => {
                let Some(message) = message else {
                    warn!("subscriber_stream_closed");
                    break;
                };

                let payload = message.get_payload_bytes();
                let event_type = WebhookEvent::from_slice(payload)
                    .map(|event| event.event_type)
                    .unwrap_or_else(|_| "unknown".to_string());

                info!(
                    channel = %message.get_channel_name(),
                    event_type = %event_type,
                    payload = %String::from_utf8_lossy(payload),
                    "event_received"
                );
            }
        }
    }

    info!("subscriber_shutdown_complete");
    Ok(())
}

//! Redis pub/sub publisher.
//!
//! Wraps a [`ConnectionManager`], which multiplexes commands over one
//! connection and reconnects on failure. Cloning is cheap and every clone
//! shares the same connection.

use std::time::Duration;

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::info;
use url::Url;

use super::{BusError, MessageBus};

/// Redis-backed [`MessageBus`].
#[derive(Clone)]
pub struct RedisBus {
    conn: ConnectionManager,
}

impl RedisBus {
    /// Connect to Redis and confirm the connection with a PING.
    ///
    /// The whole sequence is bounded by `connect_timeout`.
    pub async fn connect(
        addr: &str,
        password: Option<&str>,
        connect_timeout: Duration,
    ) -> Result<Self, BusError> {
        let url = connection_url(addr, password)?;
        let client = Client::open(url.as_str())?;

        info!(redis_addr = %addr, auth = password.is_some(), "redis_connecting");

        let connect = async {
            let conn = ConnectionManager::new(client).await?;
            let bus = RedisBus { conn };
            bus.ping().await?;
            Ok::<_, BusError>(bus)
        };

        let bus = tokio::time::timeout(connect_timeout, connect)
            .await
            .map_err(|_| BusError::Timeout(connect_timeout))??;

        info!(redis_addr = %addr, "redis_connected");

        Ok(bus)
    }

    /// Release the connection. Call once the HTTP server has drained.
    pub fn close(self) {
        drop(self.conn);
        info!("redis_connection_closed");
    }
}

#[async_trait]
impl MessageBus for RedisBus {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<u64, BusError> {
        let mut conn = self.conn.clone();
        let receivers: u64 = conn.publish(channel, payload).await?;
        Ok(receivers)
    }

    async fn ping(&self) -> Result<(), BusError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<()>(&mut conn).await?;
        Ok(())
    }
}

/// Build a Redis URL from a bare `host:port` or a full URL, applying the
/// password if one is configured.
pub fn connection_url(addr: &str, password: Option<&str>) -> Result<Url, BusError> {
    let mut url = if addr.contains("://") {
        Url::parse(addr)?
    } else {
        Url::parse(&format!("redis://{addr}"))?
    };

    if let Some(password) = password {
        url.set_password(Some(password))
            .map_err(|_| BusError::PasswordNotSupported(addr.to_string()))?;
    }

    Ok(url)
}

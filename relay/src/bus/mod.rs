//! Message bus boundary.
//!
//! The web handlers only need two operations from the bus: publish raw bytes
//! to a channel, and ping for liveness. [`MessageBus`] captures that, with
//! [`RedisBus`] as the production implementation.
//!
//! ```text
//! POST /webhook → verify → MessageBus::publish(channel, raw body) → subscribers
//! ```

#[cfg(test)]
pub mod memory;
pub mod redis_bus;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use redis_bus::RedisBus;

/// Errors talking to the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid redis address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    #[error("redis address {0} cannot carry a password")]
    PasswordNotSupported(String),
}

/// A publish-capable pub/sub client.
///
/// Implementations must be safe to share across concurrent requests without
/// external locking.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish `payload` unchanged to `channel`. Returns the number of
    /// subscribers that received it.
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<u64, BusError>;

    /// Round-trip a liveness check to the bus.
    async fn ping(&self) -> Result<(), BusError>;
}

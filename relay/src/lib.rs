//! Starling Relay - verified webhook to Redis pub/sub bridge.
//!
//! This library provides shared modules for the two binaries:
//! - `relay-web`: Web server that verifies and republishes webhooks
//! - `relay-subscriber`: Example subscriber that prints published events
//!
//! ## Architecture
//!
//! ```text
//! Starling → POST /webhook → verify signature → Redis PUBLISH → subscribers
//! ```

pub mod bus;
pub mod config;
pub mod event;
pub mod signature;
pub mod util;
pub mod web;

// Re-export commonly used types
pub use bus::{BusError, MessageBus, RedisBus};
pub use config::{Config, VerificationMode};
pub use event::WebhookEvent;
pub use signature::{KeyError, Verifier, SIGNATURE_HEADER};
pub use web::{router, AppState};

//! Starling webhook envelope.
//!
//! The envelope is decoded only so the bridge can log what it forwards. The
//! bytes published to Redis are always the original request body, since the
//! sender's signature covers those exact bytes.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::value::RawValue;

/// Parsed view of an inbound webhook payload.
///
/// Unknown fields are ignored; only `eventType` is required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    /// Event type, e.g. `TRANSACTION_FEED_ITEM_CREATED`
    pub event_type: String,
    /// ISO-8601 timestamp as sent
    #[serde(default)]
    pub timestamp: String,
    /// Event body, kept as unparsed JSON
    #[serde(default)]
    pub content: Option<Box<RawValue>>,
    #[serde(default)]
    pub account_holder_uid: Option<String>,
    #[serde(default)]
    pub event_id: Option<String>,
}

impl WebhookEvent {
    /// Decode an envelope from raw body bytes.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Timestamp parsed as RFC 3339, if well formed.
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.timestamp).ok()
    }
}

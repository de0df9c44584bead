//! Webhook and health endpoint handlers.
//!
//! The webhook handler is a short pipeline that stops at the first failure:
//! 1. Method check (405)
//! 2. Body read, bounded by `max_body_bytes` and `read_timeout` (400)
//! 3. Signature check over the raw bytes (401)
//! 4. Envelope decode, for logging only (400)
//! 5. Publish the raw bytes to the channel (500)
//!
//! Nothing is retried and nothing is kept between requests.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::{Method, StatusCode},
};
use tokio::time::timeout;
use tracing::{error, info, warn};

use crate::bus::MessageBus;
use crate::event::WebhookEvent;
use crate::signature::{Verifier, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
    pub bus: Arc<dyn MessageBus>,
    pub channel: Arc<str>,
    pub max_body_bytes: usize,
    pub read_timeout: Duration,
    pub publish_timeout: Duration,
    pub health_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config, verifier: Verifier, bus: Arc<dyn MessageBus>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            bus,
            channel: Arc::from(config.redis_channel.as_str()),
            max_body_bytes: config.max_body_bytes,
            read_timeout: config.read_timeout(),
            publish_timeout: config.publish_timeout(),
            health_timeout: config.health_timeout(),
        }
    }
}

/// Plain-text response: status plus a short body.
pub type TextResponse = (StatusCode, &'static str);

const OK: TextResponse = (StatusCode::OK, "OK");
const METHOD_NOT_ALLOWED: TextResponse = (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
const BAD_REQUEST: TextResponse = (StatusCode::BAD_REQUEST, "Bad request");
const UNAUTHORIZED: TextResponse = (StatusCode::UNAUTHORIZED, "Unauthorized");
const INTERNAL_ERROR: TextResponse = (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
const UNAVAILABLE: TextResponse = (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable");

// =============================================================================
// Health Check
// =============================================================================

/// Health check endpoint. Pings the bus within `health_timeout`.
pub async fn health(State(state): State<AppState>) -> TextResponse {
    match timeout(state.health_timeout, state.bus.ping()).await {
        Ok(Ok(())) => OK,
        Ok(Err(e)) => {
            warn!(error = %e, "health_bus_ping_failed");
            UNAVAILABLE
        }
        Err(_) => {
            warn!(
                timeout_ms = state.health_timeout.as_millis() as u64,
                "health_bus_ping_timed_out"
            );
            UNAVAILABLE
        }
    }
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook endpoint.
///
/// Mounted for every method so the method check happens here, before the
/// body is touched.
pub async fn webhook(State(state): State<AppState>, request: Request) -> TextResponse {
    if request.method() != Method::POST {
        warn!(method = %request.method(), "webhook_method_not_allowed");
        return METHOD_NOT_ALLOWED;
    }

    let (parts, body) = request.into_parts();

    let body = match timeout(state.read_timeout, to_bytes(body, state.max_body_bytes)).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            warn!(
                error = %e,
                max_body_bytes = state.max_body_bytes,
                "webhook_body_read_failed"
            );
            return BAD_REQUEST;
        }
        Err(_) => {
            warn!(
                timeout_ms = state.read_timeout.as_millis() as u64,
                "webhook_body_read_timed_out"
            );
            return BAD_REQUEST;
        }
    };

    // A missing header is checked like any other value.
    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !state.verifier.verify(&body, signature) {
        warn!(
            mode = state.verifier.mode_name(),
            has_signature = !signature.is_empty(),
            body_length = body.len(),
            "webhook_signature_invalid"
        );
        return UNAUTHORIZED;
    }

    let event = match WebhookEvent::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, body_length = body.len(), "webhook_parse_failed");
            return BAD_REQUEST;
        }
    };

    match timeout(state.publish_timeout, state.bus.publish(&state.channel, &body)).await {
        Ok(Ok(receivers)) => {
            info!(
                event_type = %event.event_type,
                event_id = event.event_id.as_deref().unwrap_or(""),
                event_timestamp = %event.timestamp,
                channel = %state.channel,
                body_length = body.len(),
                receivers = receivers,
                "webhook_published"
            );
            OK
        }
        Ok(Err(e)) => {
            error!(
                error = %e,
                event_type = %event.event_type,
                channel = %state.channel,
                "webhook_publish_failed"
            );
            INTERNAL_ERROR
        }
        Err(_) => {
            error!(
                timeout_ms = state.publish_timeout.as_millis() as u64,
                event_type = %event.event_type,
                channel = %state.channel,
                "webhook_publish_timed_out"
            );
            INTERNAL_ERROR
        }
    }
}

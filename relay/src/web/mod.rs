//! Web server module for the webhook bridge.
//!
//! This module provides a thin web server that:
//! - Receives Starling webhooks on `/webhook`
//! - Verifies the `X-Hook-Signature` header over the raw body
//! - Publishes the untouched body to the Redis channel
//! - Reports bus liveness on `/health`

pub mod handlers;

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{health, webhook, AppState, TextResponse};

/// Build the application router.
///
/// Each downstream wait is bounded inside the handlers: body read, publish
/// and health ping all carry their own timeout from [`AppState`].
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", any(webhook))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

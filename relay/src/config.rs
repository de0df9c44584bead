//! Configuration module for environment variable parsing.
//!
//! Everything is read once at startup; unset or unparsable values fall back
//! to defaults so the service can boot against a local Redis with no setup.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

/// How the webhook secret is interpreted when verifying signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationMode {
    /// Secret is a shared HMAC-SHA512 key.
    #[default]
    Hmac,
    /// Secret is a base64 DER (SubjectPublicKeyInfo) RSA public key.
    Rsa,
}

impl FromStr for VerificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmac" | "hmac-sha512" => Ok(Self::Hmac),
            "rsa" | "rsa-sha256" => Ok(Self::Rsa),
            other => Err(format!("unknown verification mode: {other}")),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Redis address, either `host:port` or a full `redis://` URL
    pub redis_addr: String,

    /// Optional Redis password
    pub redis_password: Option<String>,

    /// Pub/sub channel that verified events are published to
    pub redis_channel: String,

    /// Webhook secret; `None` disables verification
    pub webhook_secret: Option<String>,

    /// Interpretation of `webhook_secret`
    pub verification_mode: VerificationMode,

    /// Maximum accepted webhook body size in bytes
    pub max_body_bytes: usize,

    /// Upper bound on reading a webhook body
    pub read_timeout_ms: u64,

    /// Upper bound on a single publish call
    pub publish_timeout_ms: u64,

    /// Upper bound on the health check ping
    pub health_timeout_ms: u64,

    /// Upper bound on the startup connection test
    pub connect_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            redis_addr: "localhost:6379".to_string(),
            redis_password: None,
            redis_channel: "starling_events".to_string(),
            webhook_secret: None,
            verification_mode: VerificationMode::Hmac,
            max_body_bytes: 1024 * 1024,
            read_timeout_ms: 10_000,
            publish_timeout_ms: 5_000,
            health_timeout_ms: 2_000,
            connect_timeout_ms: 5_000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Config::default();

        Config {
            port: parse_or("PORT", defaults.port),

            redis_addr: non_empty("REDIS_ADDR").unwrap_or(defaults.redis_addr),

            redis_password: non_empty("REDIS_PASSWORD"),

            redis_channel: non_empty("REDIS_CHANNEL").unwrap_or(defaults.redis_channel),

            webhook_secret: non_empty("WEBHOOK_SECRET"),

            verification_mode: parse_or("WEBHOOK_VERIFICATION", defaults.verification_mode),

            max_body_bytes: parse_or("MAX_BODY_BYTES", defaults.max_body_bytes),

            read_timeout_ms: parse_or("READ_TIMEOUT_MS", defaults.read_timeout_ms),

            publish_timeout_ms: parse_or("PUBLISH_TIMEOUT_MS", defaults.publish_timeout_ms),

            health_timeout_ms: parse_or("HEALTH_TIMEOUT_MS", defaults.health_timeout_ms),

            connect_timeout_ms: parse_or("CONNECT_TIMEOUT_MS", defaults.connect_timeout_ms),
        }
    }

    /// Log warnings for insecure but permitted setups.
    ///
    /// Called once at startup so open mode is never silent.
    pub fn warn_insecure(&self) {
        if self.webhook_secret.is_none() {
            warn!("webhook_secret_not_set_signature_verification_disabled");
        }

        if self.redis_password.is_none() {
            warn!("redis_password_not_set_connecting_without_auth");
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_millis(self.health_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("redis_addr", &self.redis_addr)
            .field("redis_password", &self.redis_password.as_ref().map(|_| "<redacted>"))
            .field("redis_channel", &self.redis_channel)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("verification_mode", &self.verification_mode)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("read_timeout_ms", &self.read_timeout_ms)
            .field("publish_timeout_ms", &self.publish_timeout_ms)
            .field("health_timeout_ms", &self.health_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

/// Read a variable, treating empty or whitespace-only values as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a variable, falling back to `default` when unset or invalid.
fn parse_or<T: FromStr>(name: &str, default: T) -> T {
    let raw = match non_empty(name) {
        Some(v) => v,
        None => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid value, using default");
            default
        }
    }
}

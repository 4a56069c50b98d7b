//! Session configuration
//!
//! Defines all configurable parameters for observing a job: backend
//! endpoint, credential, reconnection policy and health-check cadence.

use std::time::Duration;

use uuid::Uuid;

use crate::backoff::Backoff;
use crate::error::{Result, SessionError};

/// Configuration for one streaming session
///
/// Intervals and the retry budget are tunable so tests and slow networks
/// can deviate from the production defaults.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend base URL (e.g., "https://scanner.example.com")
    pub base_url: String,

    /// Bearer credential attached to the channel handshake when present
    pub token: Option<String>,

    /// Reconnection delay schedule and attempt ceiling
    pub backoff: Backoff,

    /// Interval between liveness probes while connected
    pub health_interval: Duration,
}

impl SessionConfig {
    /// Creates a configuration with production defaults
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            backoff: Backoff::default(),
            health_interval: Duration::from_secs(30),
        }
    }

    /// Attaches a bearer credential
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - SPYGLASS_API_URL (required)
    /// - SPYGLASS_TOKEN (optional)
    /// - SPYGLASS_HEALTH_INTERVAL (optional, seconds, default: 30)
    /// - SPYGLASS_MAX_RECONNECT_ATTEMPTS (optional, default: 5)
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("SPYGLASS_API_URL").map_err(|_| {
            SessionError::InvalidConfig("SPYGLASS_API_URL environment variable not set".to_string())
        })?;

        let mut config = Self::new(base_url);
        config.token = std::env::var("SPYGLASS_TOKEN").ok();

        if let Some(seconds) = std::env::var("SPYGLASS_HEALTH_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            config.health_interval = Duration::from_secs(seconds);
        }

        if let Some(attempts) = std::env::var("SPYGLASS_MAX_RECONNECT_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            config.backoff.max_attempts = attempts;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(SessionError::InvalidConfig(
                "base_url cannot be empty".to_string(),
            ));
        }

        let has_known_scheme = ["http://", "https://", "ws://", "wss://"]
            .iter()
            .any(|scheme| self.base_url.starts_with(scheme));
        if !has_known_scheme {
            return Err(SessionError::InvalidConfig(
                "base_url must start with http://, https://, ws:// or wss://".to_string(),
            ));
        }

        if self.health_interval.is_zero() {
            return Err(SessionError::InvalidConfig(
                "health_interval must be greater than 0".to_string(),
            ));
        }

        if self.backoff.max_attempts == 0 {
            return Err(SessionError::InvalidConfig(
                "max reconnect attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Channel endpoint for one job
    ///
    /// The WebSocket scheme mirrors the security posture of the base URL:
    /// https becomes wss, http becomes ws. A ws/wss base is used as-is.
    pub fn endpoint_for(&self, job_id: Uuid) -> String {
        let base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };

        format!("{base}/api/v1/ws/jobs/{job_id}")
    }
}

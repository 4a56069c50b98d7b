//! Error types for the streaming client

use thiserror::Error;

/// Result type alias for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by the session and its transport
///
/// Most failures inside the session are absorbed: connect failures feed the
/// retry loop, decode failures drop the frame, send failures become warnings.
/// Only externally meaningful outcomes are represented here.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The channel failed to open or dropped mid-stream
    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// The retry budget is spent; no further automatic reconnection
    #[error("failed to connect after {attempts} attempt(s)")]
    ExhaustedRetries {
        /// Consecutive failed attempts since the last successful open
        attempts: u32,
    },

    /// Configuration rejected before any I/O happened
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SessionError {
    /// Check if this error means the retry budget is spent
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::ExhaustedRetries { .. })
    }

    /// Check if this error came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// A frame that could not be turned into a typed envelope
///
/// Decode errors never propagate past the dispatch boundary: the offending
/// frame is logged and dropped, the channel stays up.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Frame was not valid JSON or a known payload failed to parse
    #[error("malformed frame: {0}")]
    Malformed(String),

    /// Envelope carried a tag this client does not understand
    #[error("unknown message type: {0}")]
    UnknownType(String),
}

//! Wire protocol for the progress stream
//!
//! One duplex channel per observed job. The backend pushes envelopes of the
//! shape `{type, timestamp, data}`; the observer answers with bare command
//! tokens (`ping`, `status`, `logs`) or arbitrary serialized objects for
//! forward compatibility. The tag set is open ended: decoders must treat
//! unrecognized tags as ignorable, never as channel faults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::job::{JobSnapshot, JobStatus};
use crate::domain::log::LogEntry;

/// Raw wire envelope, exactly as the backend emits it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: Value,
}

/// A decoded envelope: emission timestamp plus the typed event
#[derive(Debug, Clone)]
pub struct Envelope {
    pub timestamp: DateTime<Utc>,
    pub event: ServerEvent,
}

/// Typed server events carried by envelopes
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// Full job snapshot, replaces the observed state wholesale
    Status(JobSnapshot),
    /// Incremental progress update
    Progress(ProgressUpdate),
    /// Single appended log line
    Log(LogEntry),
    /// Bulk log snapshot, replaces accumulated log history
    Logs(Vec<LogEntry>),
    /// One incremental result record, opaque to the client
    Result(Value),
    /// Server-reported error, informational only
    Error(ServerError),
    /// Terminal transition
    Complete(CompletePayload),
    /// Liveness acknowledgment
    Pong,
}

impl ServerEvent {
    /// Wire tag for this event
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status",
            Self::Progress(_) => "progress",
            Self::Log(_) => "log",
            Self::Logs(_) => "logs",
            Self::Result(_) => "result",
            Self::Error(_) => "error",
            Self::Complete(_) => "complete",
            Self::Pong => "pong",
        }
    }
}

/// Payload of a `progress` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub progress: u8,
    pub step: Option<String>,
}

/// Payload of an `error` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerError {
    pub error: String,
}

/// Payload of a `complete` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletePayload {
    pub status: JobStatus,
}

/// Outgoing command from the observer to the backend
#[derive(Debug, Clone)]
pub enum Command {
    /// Liveness probe, answered with `pong`
    Ping,
    /// Request a fresh status snapshot
    Status,
    /// Request a fresh bulk log snapshot
    Logs,
    /// Arbitrary structured command, serialized as-is
    Custom(Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_envelope_parses_without_data() {
        let raw: RawEnvelope =
            serde_json::from_str(r#"{"type":"pong","timestamp":"2026-01-05T10:00:00Z"}"#).unwrap();
        assert_eq!(raw.kind, "pong");
        assert!(raw.data.is_null());
    }

    #[test]
    fn test_event_kinds_match_wire_tags() {
        assert_eq!(ServerEvent::Pong.kind(), "pong");
        assert_eq!(
            ServerEvent::Result(Value::Null).kind(),
            "result"
        );
        assert_eq!(
            ServerEvent::Complete(CompletePayload {
                status: JobStatus::Completed
            })
            .kind(),
            "complete"
        );
    }
}

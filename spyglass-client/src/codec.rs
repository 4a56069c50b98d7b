//! Message codec
//!
//! Turns raw text frames into typed envelopes and serializes outgoing
//! commands. A frame the codec cannot understand is an error for the caller
//! to log and drop; it must never take the channel down.

use serde::de::DeserializeOwned;
use serde_json::Value;

use spyglass_core::domain::log::LogEntry;
use spyglass_core::protocol::{Command, Envelope, RawEnvelope, ServerEvent};

use crate::error::DecodeError;

/// Decode one incoming frame into a typed envelope
pub fn decode(frame: &str) -> std::result::Result<Envelope, DecodeError> {
    let raw: RawEnvelope =
        serde_json::from_str(frame).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    let event = match raw.kind.as_str() {
        "status" => ServerEvent::Status(payload(raw.data)?),
        "progress" => ServerEvent::Progress(payload(raw.data)?),
        "log" => ServerEvent::Log(payload(raw.data)?),
        "logs" => ServerEvent::Logs(log_batch(raw.data)?),
        "result" => ServerEvent::Result(raw.data),
        "error" => ServerEvent::Error(payload(raw.data)?),
        "complete" => ServerEvent::Complete(payload(raw.data)?),
        "pong" => ServerEvent::Pong,
        other => return Err(DecodeError::UnknownType(other.to_string())),
    };

    Ok(Envelope {
        timestamp: raw.timestamp,
        event,
    })
}

/// Serialize an outgoing command to its wire form
///
/// The three built-in requests are bare tokens; structured commands go out
/// as JSON for forward compatibility.
pub fn encode(command: &Command) -> String {
    match command {
        Command::Ping => "ping".to_string(),
        Command::Status => "status".to_string(),
        Command::Logs => "logs".to_string(),
        Command::Custom(value) => value.to_string(),
    }
}

fn payload<T: DeserializeOwned>(data: Value) -> std::result::Result<T, DecodeError> {
    serde_json::from_value(data).map_err(|e| DecodeError::Malformed(e.to_string()))
}

/// The backend normally sends an array; a bare entry is accepted as a batch
/// of one.
fn log_batch(data: Value) -> std::result::Result<Vec<LogEntry>, DecodeError> {
    match data {
        Value::Array(_) => payload(data),
        other => Ok(vec![payload(other)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use spyglass_core::domain::job::JobStatus;
    use spyglass_core::domain::log::LogLevel;

    fn frame(kind: &str, data: Value) -> String {
        json!({ "type": kind, "timestamp": "2026-02-10T09:30:00Z", "data": data }).to_string()
    }

    #[test]
    fn test_decode_status() {
        let text = frame(
            "status",
            json!({
                "id": "7b0d9579-4c3e-4db7-8a5b-6f2d0c4b9e21",
                "name": "full-scan",
                "status": "running",
                "progress": 10,
                "current_step": null,
                "total_steps": 4,
                "started_at": "2026-02-10T09:00:00Z",
                "completed_at": null
            }),
        );

        let envelope = decode(&text).unwrap();
        match envelope.event {
            ServerEvent::Status(snapshot) => {
                assert_eq!(snapshot.status, JobStatus::Running);
                assert_eq!(snapshot.progress, 10);
                assert_eq!(snapshot.name, "full-scan");
            }
            other => panic!("expected status, got {}", other.kind()),
        }
    }

    #[test]
    fn test_decode_progress() {
        let text = frame("progress", json!({ "progress": 55, "step": "scanning" }));
        match decode(&text).unwrap().event {
            ServerEvent::Progress(update) => {
                assert_eq!(update.progress, 55);
                assert_eq!(update.step.as_deref(), Some("scanning"));
            }
            other => panic!("expected progress, got {}", other.kind()),
        }
    }

    #[test]
    fn test_decode_log_and_logs() {
        let entry = json!({
            "timestamp": "2026-02-10T09:31:00Z",
            "level": "WARNING",
            "message": "port 443 filtered"
        });

        match decode(&frame("log", entry.clone())).unwrap().event {
            ServerEvent::Log(log) => {
                assert_eq!(log.level, LogLevel::Warning);
                assert_eq!(log.message, "port 443 filtered");
            }
            other => panic!("expected log, got {}", other.kind()),
        }

        match decode(&frame("logs", json!([entry, entry]))).unwrap().event {
            ServerEvent::Logs(entries) => assert_eq!(entries.len(), 2),
            other => panic!("expected logs, got {}", other.kind()),
        }
    }

    #[test]
    fn test_decode_logs_accepts_bare_entry() {
        let entry = json!({
            "timestamp": "2026-02-10T09:31:00Z",
            "level": "INFO",
            "message": "single"
        });
        match decode(&frame("logs", entry)).unwrap().event {
            ServerEvent::Logs(entries) => assert_eq!(entries.len(), 1),
            other => panic!("expected logs, got {}", other.kind()),
        }
    }

    #[test]
    fn test_decode_result_is_opaque() {
        let text = frame("result", json!({ "port": 22, "service": "ssh", "banner": null }));
        match decode(&text).unwrap().event {
            ServerEvent::Result(record) => assert_eq!(record["port"], 22),
            other => panic!("expected result, got {}", other.kind()),
        }
    }

    #[test]
    fn test_decode_error_and_complete() {
        match decode(&frame("error", json!({ "error": "scanner crashed" })))
            .unwrap()
            .event
        {
            ServerEvent::Error(err) => assert_eq!(err.error, "scanner crashed"),
            other => panic!("expected error, got {}", other.kind()),
        }

        match decode(&frame("complete", json!({ "status": "failed" })))
            .unwrap()
            .event
        {
            ServerEvent::Complete(payload) => assert_eq!(payload.status, JobStatus::Failed),
            other => panic!("expected complete, got {}", other.kind()),
        }
    }

    #[test]
    fn test_decode_pong_ignores_missing_data() {
        let text = json!({ "type": "pong", "timestamp": "2026-02-10T09:30:00Z" }).to_string();
        assert!(matches!(decode(&text).unwrap().event, ServerEvent::Pong));
    }

    #[test]
    fn test_unknown_type_is_reported_not_fatal() {
        let err = decode(&frame("telemetry", json!({}))).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownType(ref t) if t == "telemetry"));
    }

    #[test]
    fn test_malformed_frame_and_payload() {
        assert!(matches!(
            decode("not json at all").unwrap_err(),
            DecodeError::Malformed(_)
        ));

        // known tag, wrong payload shape
        let text = frame("progress", json!({ "progress": "eleven" }));
        assert!(matches!(decode(&text).unwrap_err(), DecodeError::Malformed(_)));
    }

    #[test]
    fn test_encode_commands() {
        assert_eq!(encode(&Command::Ping), "ping");
        assert_eq!(encode(&Command::Status), "status");
        assert_eq!(encode(&Command::Logs), "logs");
        assert_eq!(
            encode(&Command::Custom(json!({ "action": "subscribe", "channel": "results" }))),
            r#"{"action":"subscribe","channel":"results"}"#
        );
    }
}

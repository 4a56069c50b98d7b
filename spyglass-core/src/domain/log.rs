//! Log domain types

use serde::{Deserialize, Serialize};

/// A log entry emitted during job execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub level: LogLevel,
    pub message: String,
}

/// Severity of a log entry, uppercase on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_wire_casing() {
        assert_eq!(
            serde_json::to_string(&LogLevel::Warning).unwrap(),
            "\"WARNING\""
        );
        let level: LogLevel = serde_json::from_str("\"CRITICAL\"").unwrap();
        assert_eq!(level, LogLevel::Critical);
    }

    #[test]
    fn test_entry_roundtrip() {
        let entry = LogEntry {
            timestamp: chrono::Utc::now(),
            level: LogLevel::Info,
            message: "scan started".to_string(),
        };

        let json = serde_json::to_string(&entry).unwrap();
        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.level, LogLevel::Info);
        assert_eq!(parsed.message, "scan started");
    }
}

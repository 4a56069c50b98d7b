//! Progress aggregator
//!
//! Folds decoded events into the job view. Events are applied strictly in
//! arrival order by the session's single processing loop, one at a time, so
//! readers only ever see the view before or after a whole event.

use spyglass_core::protocol::ServerEvent;
use tracing::debug;

use crate::view::JobView;

/// Apply one event to the view
pub fn apply(view: &mut JobView, event: ServerEvent) {
    match event {
        ServerEvent::Status(snapshot) => {
            view.status = Some(snapshot.status);
            view.progress = snapshot.progress;
            view.current_step = snapshot.current_step.clone();
            if snapshot.status.is_terminal() {
                view.is_terminal = true;
            }
            view.snapshot = Some(snapshot);
        }
        ServerEvent::Progress(update) => {
            view.progress = update.progress;
            view.current_step = update.step;
        }
        ServerEvent::Log(entry) => {
            view.logs.push(entry);
        }
        ServerEvent::Logs(entries) => {
            // snapshot semantics: replaces everything accumulated so far
            view.logs = entries;
        }
        ServerEvent::Result(record) => {
            view.results.push(record);
        }
        ServerEvent::Error(err) => {
            view.last_error = Some(err.error);
        }
        ServerEvent::Complete(payload) => {
            view.is_terminal = true;
            view.progress = 100;
            view.status = Some(payload.status);
            if let Some(snapshot) = &mut view.snapshot {
                snapshot.status = payload.status;
                snapshot.progress = 100;
            }
        }
        ServerEvent::Pong => {
            debug!(job = %view.job_id, "liveness acknowledged");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use spyglass_core::domain::job::{JobSnapshot, JobStatus};
    use spyglass_core::domain::log::{LogEntry, LogLevel};
    use spyglass_core::protocol::{CompletePayload, ProgressUpdate, ServerError};
    use uuid::Uuid;

    fn view() -> JobView {
        JobView::new(Uuid::new_v4())
    }

    fn snapshot(status: JobStatus, progress: u8) -> JobSnapshot {
        JobSnapshot {
            id: Uuid::new_v4(),
            name: "full-scan".to_string(),
            status,
            progress,
            current_step: None,
            total_steps: None,
            started_at: None,
            completed_at: None,
        }
    }

    fn log(message: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_status_then_progress() {
        // spec'd interleaving: snapshot first, incremental update second
        let mut view = view();
        apply(&mut view, ServerEvent::Status(snapshot(JobStatus::Running, 10)));
        apply(
            &mut view,
            ServerEvent::Progress(ProgressUpdate {
                progress: 55,
                step: Some("scanning".to_string()),
            }),
        );

        assert_eq!(view.status, Some(JobStatus::Running));
        assert_eq!(view.progress, 55);
        assert_eq!(view.current_step.as_deref(), Some("scanning"));
        assert!(!view.is_terminal);
    }

    #[test]
    fn test_progress_does_not_touch_status() {
        let mut view = view();
        apply(
            &mut view,
            ServerEvent::Progress(ProgressUpdate {
                progress: 5,
                step: None,
            }),
        );
        assert_eq!(view.status, None);
        assert_eq!(view.progress, 5);
    }

    #[test]
    fn test_progress_regression_passes_through() {
        // monotonic progress is a server contract; a regressing value is
        // displayed verbatim rather than clamped
        let mut view = view();
        apply(
            &mut view,
            ServerEvent::Progress(ProgressUpdate {
                progress: 80,
                step: None,
            }),
        );
        apply(
            &mut view,
            ServerEvent::Progress(ProgressUpdate {
                progress: 30,
                step: None,
            }),
        );
        assert_eq!(view.progress, 30);
    }

    #[test]
    fn test_logs_snapshot_then_append() {
        let mut view = view();
        apply(
            &mut view,
            ServerEvent::Logs(vec![log("one"), log("two"), log("three")]),
        );
        apply(&mut view, ServerEvent::Log(log("four")));

        assert_eq!(view.logs.len(), 4);
        assert_eq!(view.logs[0].message, "one");
        assert_eq!(view.logs[3].message, "four");
    }

    #[test]
    fn test_append_only_law() {
        let mut view = view();
        let before = view.logs.len();

        apply(&mut view, ServerEvent::Log(log("a")));
        apply(&mut view, ServerEvent::Result(json!({ "n": 1 })));
        apply(&mut view, ServerEvent::Pong);
        apply(&mut view, ServerEvent::Log(log("b")));
        apply(
            &mut view,
            ServerEvent::Error(ServerError {
                error: "transient".to_string(),
            }),
        );
        apply(&mut view, ServerEvent::Result(json!({ "n": 2 })));

        assert_eq!(view.logs.len(), before + 2);
        assert_eq!(view.results.len(), 2);

        // a later bulk snapshot resets logs to exactly its own length
        apply(&mut view, ServerEvent::Logs(vec![log("fresh")]));
        assert_eq!(view.logs.len(), 1);
        // results are never replaced
        assert_eq!(view.results.len(), 2);
    }

    #[test]
    fn test_error_sets_last_error_only() {
        let mut view = view();
        apply(&mut view, ServerEvent::Status(snapshot(JobStatus::Running, 20)));
        apply(
            &mut view,
            ServerEvent::Error(ServerError {
                error: "target unreachable".to_string(),
            }),
        );

        assert_eq!(view.last_error.as_deref(), Some("target unreachable"));
        assert_eq!(view.status, Some(JobStatus::Running));
        assert!(!view.is_terminal);
    }

    #[test]
    fn test_complete_forces_terminal_and_full_progress() {
        let mut view = view();
        apply(&mut view, ServerEvent::Status(snapshot(JobStatus::Running, 60)));
        apply(
            &mut view,
            ServerEvent::Complete(CompletePayload {
                status: JobStatus::Failed,
            }),
        );

        assert!(view.is_terminal);
        assert_eq!(view.progress, 100);
        assert_eq!(view.status, Some(JobStatus::Failed));
        let snapshot = view.snapshot.unwrap();
        assert_eq!(snapshot.status, JobStatus::Failed);
        assert_eq!(snapshot.progress, 100);
    }

    #[test]
    fn test_terminal_status_snapshot_latches() {
        let mut view = view();
        apply(&mut view, ServerEvent::Status(snapshot(JobStatus::Completed, 100)));
        assert!(view.is_terminal);
    }

    #[test]
    fn test_well_formed_stream_never_leaves_terminal() {
        // the backend contract says terminal is final; verify the view
        // reproduces a compliant stream faithfully
        let mut view = view();
        let stream = vec![
            ServerEvent::Status(snapshot(JobStatus::Pending, 0)),
            ServerEvent::Status(snapshot(JobStatus::Running, 30)),
            ServerEvent::Log(log("working")),
            ServerEvent::Status(snapshot(JobStatus::Running, 90)),
            ServerEvent::Complete(CompletePayload {
                status: JobStatus::Completed,
            }),
        ];

        let mut seen_terminal = false;
        for event in stream {
            apply(&mut view, event);
            if seen_terminal {
                assert!(view.status.is_some_and(|s| s.is_terminal()));
            }
            seen_terminal = view.is_terminal;
        }
        assert!(view.is_terminal);
    }

    #[test]
    fn test_pong_changes_nothing() {
        let mut view = view();
        apply(&mut view, ServerEvent::Status(snapshot(JobStatus::Running, 40)));
        let before = view.clone();
        apply(&mut view, ServerEvent::Pong);

        assert_eq!(view.status, before.status);
        assert_eq!(view.progress, before.progress);
        assert_eq!(view.logs.len(), before.logs.len());
        assert_eq!(view.last_error, before.last_error);
    }
}

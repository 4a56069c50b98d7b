//! Aggregated job view
//!
//! The externally observable state of one observed job, rebuilt from the
//! message stream. Written only by the session's processing loop; readers
//! take cloned snapshots.

use serde_json::Value;
use uuid::Uuid;

use spyglass_core::domain::job::{JobSnapshot, JobStatus};
use spyglass_core::domain::log::LogEntry;

/// Channel connectivity, independent of job status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    Connected,
    #[default]
    Disconnected,
}

/// Aggregated state for one job
#[derive(Debug, Clone)]
pub struct JobView {
    /// Fixed at construction; a different job means a different session
    pub job_id: Uuid,
    /// `None` until the first `status` or `complete` envelope arrives
    pub status: Option<JobStatus>,
    /// Raw progress percentage as reported; the backend is trusted to keep
    /// it non-decreasing and the client displays it verbatim
    pub progress: u8,
    pub current_step: Option<String>,
    /// Append-only within the session, except when a bulk `logs` snapshot
    /// replaces the accumulated history
    pub logs: Vec<LogEntry>,
    /// Append-only, never replaced
    pub results: Vec<Value>,
    pub connectivity: Connectivity,
    /// Last transport- or server-reported error; cleared on successful
    /// reconnect, untouched by unrelated events
    pub last_error: Option<String>,
    /// Latched once the job reaches a terminal status
    pub is_terminal: bool,
    /// Last full snapshot (name, step counts, timestamps)
    pub snapshot: Option<JobSnapshot>,
}

impl JobView {
    /// Empty view for a job that has not been observed yet
    pub fn new(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: None,
            progress: 0,
            current_step: None,
            logs: Vec::new(),
            results: Vec::new(),
            connectivity: Connectivity::Disconnected,
            last_error: None,
            is_terminal: false,
            snapshot: None,
        }
    }

    /// True while a dropped channel is worth reconnecting for
    ///
    /// Reconnection is a job-liveness optimization: only a job last seen
    /// running or paused gets one. Unknown status means no reconnect.
    pub fn wants_reconnect(&self) -> bool {
        !self.is_terminal
            && matches!(self.status, Some(JobStatus::Running) | Some(JobStatus::Paused))
    }
}

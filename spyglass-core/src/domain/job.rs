//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job execution status as reported by the scan backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Returns true for statuses the job can never leave
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Full job state snapshot
///
/// Payload of a `status` envelope. The backend sends one on connect and
/// whenever a fresh snapshot is requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub name: String,
    pub status: JobStatus,
    pub progress: u8,
    pub current_step: Option<String>,
    pub total_steps: Option<u32>,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
}

//! Spyglass Streaming Client
//!
//! A reconnecting WebSocket client that follows the execution of one
//! long-running scan job and rebuilds a consistent local view of its
//! status, progress, log lines and incremental results from the typed
//! message stream, despite network interruptions.
//!
//! The client is a best-effort observer: it reconnects and resynchronizes
//! rather than guaranteeing delivery, and it never drives the job itself.
//! All failure is represented as observable state (connectivity, last
//! error, terminal flag), never as a fault thrown at the caller.
//!
//! # Example
//!
//! ```no_run
//! use spyglass_client::{JobSession, SessionConfig};
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SessionConfig::new("https://scanner.example.com")
//!         .with_token("secret");
//!     config.validate()?;
//!
//!     let session = JobSession::new(config, Uuid::new_v4());
//!     session.connect();
//!
//!     let mut updates = session.watch_updates();
//!     while updates.changed().await.is_ok() {
//!         let view = session.view();
//!         for log in &view.logs {
//!             println!("[{:?}] {}", log.level, log.message);
//!         }
//!         if view.is_terminal {
//!             break;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod aggregator;
pub mod backoff;
pub mod codec;
pub mod config;
pub mod error;
mod monitor;
mod session;
mod transport;
mod view;

// Re-export commonly used types
pub use backoff::Backoff;
pub use config::SessionConfig;
pub use error::{DecodeError, Result, SessionError};
pub use session::{JobSession, SessionState};
pub use spyglass_core::domain::job::{JobSnapshot, JobStatus};
pub use spyglass_core::domain::log::{LogEntry, LogLevel};
pub use spyglass_core::protocol::Command;
pub use view::{Connectivity, JobView};

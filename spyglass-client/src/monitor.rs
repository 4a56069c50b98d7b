//! Health monitor
//!
//! Emits a liveness probe on a fixed interval while the channel is open.
//! The session spawns one per connection and aborts it on close. A probe
//! that cannot be delivered is skipped until the next tick, never retried.

use std::time::Duration;

use spyglass_core::protocol::Command;
use tokio::sync::mpsc;
use tokio::time;
use tracing::debug;

/// Spawn the probe ticker for one open connection
pub(crate) fn spawn(
    probes: mpsc::UnboundedSender<Command>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // the first tick completes immediately; the channel was just opened
        ticker.tick().await;

        loop {
            ticker.tick().await;
            debug!("emitting health check");
            if probes.send(Command::Ping).is_err() {
                break;
            }
        }
    })
}

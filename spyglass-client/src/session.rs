//! Reconnecting session
//!
//! One session observes one job for its whole lifetime. The raw transport
//! callbacks, the backoff timer, the health monitor and caller commands are
//! all funneled into a single actor task; the job view is written only from
//! that task, so event application needs no locks for ordering and readers
//! take cloned snapshots.
//!
//! The actor walks an explicit state machine:
//!
//! ```text
//! Idle -> Connecting -> Open -> Closing -> Idle
//!            |  ^         |
//!            |  +---------+  (unexpected close while job is active)
//!            v
//!          Failed            (retry budget spent)
//! ```

use std::sync::{Arc, RwLock};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use spyglass_core::protocol::Command;

use crate::aggregator;
use crate::codec;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::monitor;
use crate::transport::Transport;
use crate::view::{Connectivity, JobView};

/// Connection lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No channel, nothing scheduled
    Idle,
    /// Opening the channel, or waiting out a backoff delay
    Connecting,
    /// Channel is live and frames are flowing
    Open,
    /// Tearing the channel down after an explicit disconnect
    Closing,
    /// Retry budget spent; waits for an explicit connect
    Failed,
}

/// Commands accepted by the session actor
#[derive(Debug)]
enum SessionCommand {
    Connect,
    Disconnect,
    Send(Command),
}

/// Handle to a running session
///
/// Cheap to clone; every clone observes the same job view and drives the
/// same actor. Operations are fire-and-forget: callers observe the effect
/// through state transitions and view updates rather than by blocking.
///
/// # Example
///
/// ```no_run
/// use spyglass_client::{JobSession, SessionConfig};
/// use uuid::Uuid;
///
/// #[tokio::main]
/// async fn main() {
///     let config = SessionConfig::new("https://scanner.example.com");
///     let session = JobSession::new(config, Uuid::new_v4());
///     session.connect();
///
///     let mut updates = session.watch_updates();
///     while updates.changed().await.is_ok() {
///         let view = session.view();
///         println!("{}% {:?}", view.progress, view.current_step);
///         if view.is_terminal {
///             break;
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JobSession {
    job_id: Uuid,
    commands: mpsc::UnboundedSender<SessionCommand>,
    shared: SharedView,
    state_rx: watch::Receiver<SessionState>,
}

impl JobSession {
    /// Spawns the session actor for one job
    ///
    /// The session starts `Idle`; call [`connect`](Self::connect) to begin
    /// observing. Must be called from within a Tokio runtime.
    pub fn new(config: SessionConfig, job_id: Uuid) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let (update_tx, _) = watch::channel(0u64);

        let shared = SharedView {
            job_id,
            view: Arc::new(RwLock::new(JobView::new(job_id))),
            updates: Arc::new(update_tx),
        };

        let actor = SessionActor {
            config,
            job_id,
            shared: shared.clone(),
            state: state_tx,
            attempt: 0,
        };
        tokio::spawn(actor.run(command_rx));

        Self {
            job_id,
            commands: command_tx,
            shared,
            state_rx,
        }
    }

    /// The job this session observes, fixed for its lifetime
    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Begin connecting; no-op while already connecting or open
    pub fn connect(&self) {
        let _ = self.commands.send(SessionCommand::Connect);
    }

    /// Close the channel and cancel any pending retry; idempotent
    pub fn disconnect(&self) {
        let _ = self.commands.send(SessionCommand::Disconnect);
    }

    /// Send a command over the channel
    ///
    /// Dropped with a warning when the channel is not open; commands are
    /// never queued for later delivery.
    pub fn send(&self, command: Command) {
        let _ = self.commands.send(SessionCommand::Send(command));
    }

    /// Request a fresh status snapshot
    pub fn request_status(&self) {
        self.send(Command::Status);
    }

    /// Request a fresh bulk log snapshot
    pub fn request_logs(&self) {
        self.send(Command::Logs);
    }

    /// Emit a liveness probe
    pub fn health_check(&self) {
        self.send(Command::Ping);
    }

    /// Cloned snapshot of the current job view
    pub fn view(&self) -> JobView {
        self.shared.read()
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Watch lifecycle transitions without polling
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Watch the view revision counter, bumped once per applied change
    pub fn watch_updates(&self) -> watch::Receiver<u64> {
        self.shared.updates.subscribe()
    }
}

/// The view plus its change-notification side, shared with handles
#[derive(Debug, Clone)]
struct SharedView {
    job_id: Uuid,
    view: Arc<RwLock<JobView>>,
    updates: Arc<watch::Sender<u64>>,
}

impl SharedView {
    fn read(&self) -> JobView {
        self.view.read().unwrap().clone()
    }

    fn update(&self, mutate: impl FnOnce(&mut JobView)) {
        {
            let mut view = self.view.write().unwrap();
            mutate(&mut view);
        }
        self.updates.send_modify(|revision| *revision += 1);
    }

    /// Decode one frame and fold it into the view
    ///
    /// Malformed and unknown frames are dropped here; nothing a server
    /// sends can fault the session.
    fn apply_frame(&self, frame: &str) {
        match codec::decode(frame) {
            Ok(envelope) => {
                debug!("Applying '{}' envelope for job {}", envelope.event.kind(), self.job_id);
                self.update(|view| aggregator::apply(view, envelope.event));
            }
            Err(e) => {
                warn!("Dropping frame for job {}: {}", self.job_id, e);
            }
        }
    }
}

/// Why the connect/retry loop stopped
enum ConnectOutcome {
    Opened(Transport),
    Cancelled,
    Exhausted,
    Shutdown,
}

/// Why an open channel was left
enum OpenOutcome {
    RemoteClosed,
    Disconnected,
    Shutdown,
}

type CommandRx = mpsc::UnboundedReceiver<SessionCommand>;

struct SessionActor {
    config: SessionConfig,
    job_id: Uuid,
    shared: SharedView,
    state: watch::Sender<SessionState>,
    /// Consecutive failures since the last successful open; an unexpected
    /// close counts as the first
    attempt: u32,
}

impl SessionActor {
    async fn run(mut self, mut commands: CommandRx) {
        'session: loop {
            // Idle or Failed: nothing scheduled, wait for an explicit command
            loop {
                let Some(command) = commands.recv().await else {
                    return;
                };
                match command {
                    SessionCommand::Connect => {
                        self.attempt = 0;
                        break;
                    }
                    SessionCommand::Disconnect => {
                        debug!("Disconnect ignored for job {}: session is idle", self.job_id);
                    }
                    SessionCommand::Send(_) => {
                        warn!("Channel for job {} is not open, dropping command", self.job_id);
                    }
                }
            }

            // Connect, stream, reconnect on unexpected close while the job
            // is still worth watching.
            loop {
                self.state.send_replace(SessionState::Connecting);
                let transport = match self.connect_with_backoff(&mut commands).await {
                    ConnectOutcome::Opened(transport) => transport,
                    ConnectOutcome::Cancelled => {
                        self.state.send_replace(SessionState::Idle);
                        continue 'session;
                    }
                    ConnectOutcome::Exhausted => {
                        self.state.send_replace(SessionState::Failed);
                        continue 'session;
                    }
                    ConnectOutcome::Shutdown => return,
                };

                self.attempt = 0;
                self.shared.update(|view| {
                    view.connectivity = Connectivity::Connected;
                    view.last_error = None;
                });
                self.state.send_replace(SessionState::Open);
                info!("Channel open for job {}", self.job_id);

                match self.run_open(&mut commands, transport).await {
                    OpenOutcome::RemoteClosed => {
                        if self.shared.read().wants_reconnect() {
                            info!(
                                "Channel lost while job {} is active, scheduling reconnect",
                                self.job_id
                            );
                            self.attempt = 1;
                            continue;
                        }
                        debug!("Channel for job {} closed, not reconnecting", self.job_id);
                        self.state.send_replace(SessionState::Idle);
                        continue 'session;
                    }
                    OpenOutcome::Disconnected => {
                        self.state.send_replace(SessionState::Idle);
                        continue 'session;
                    }
                    OpenOutcome::Shutdown => return,
                }
            }
        }
    }

    /// Open the channel, waiting out the backoff delay before each retry
    ///
    /// Stays responsive during the delay window: a disconnect cancels the
    /// pending retry immediately.
    async fn connect_with_backoff(&mut self, commands: &mut CommandRx) -> ConnectOutcome {
        let endpoint = self.config.endpoint_for(self.job_id);

        loop {
            if self.attempt > 0 {
                let Some(delay) = self.config.backoff.delay(self.attempt) else {
                    let attempts = self.config.backoff.max_attempts;
                    warn!(
                        "Giving up on job {} after {} connection attempt(s)",
                        self.job_id, attempts
                    );
                    self.shared.update(|view| {
                        view.last_error =
                            Some(SessionError::ExhaustedRetries { attempts }.to_string());
                    });
                    return ConnectOutcome::Exhausted;
                };

                debug!(
                    "Retry {} for job {} in {:?}",
                    self.attempt, self.job_id, delay
                );
                let sleep = tokio::time::sleep(delay);
                tokio::pin!(sleep);
                loop {
                    tokio::select! {
                        _ = &mut sleep => break,
                        command = commands.recv() => match command {
                            Some(SessionCommand::Disconnect) => return ConnectOutcome::Cancelled,
                            Some(SessionCommand::Connect) => {
                                debug!("Connect ignored for job {}: already connecting", self.job_id);
                            }
                            Some(SessionCommand::Send(_)) => {
                                warn!("Channel for job {} is not open, dropping command", self.job_id);
                            }
                            None => return ConnectOutcome::Shutdown,
                        },
                    }
                }
            }

            match Transport::open(&endpoint, self.config.token.as_deref()).await {
                Ok(transport) => return ConnectOutcome::Opened(transport),
                Err(e) => {
                    self.attempt += 1;
                    warn!(
                        "Connection attempt {} for job {} failed: {}",
                        self.attempt, self.job_id, e
                    );
                    self.shared.update(|view| view.last_error = Some(e.to_string()));
                }
            }
        }
    }

    /// Stream frames and serve commands until the channel goes away
    async fn run_open(&mut self, commands: &mut CommandRx, transport: Transport) -> OpenOutcome {
        let Transport {
            mut writer,
            mut reader,
        } = transport;

        let (probe_tx, mut probes) = mpsc::unbounded_channel();
        let monitor = monitor::spawn(probe_tx, self.config.health_interval);

        let outcome = loop {
            tokio::select! {
                frame = reader.next_text() => match frame {
                    Ok(Some(text)) => self.shared.apply_frame(&text),
                    Ok(None) => {
                        info!("Channel for job {} closed by server", self.job_id);
                        break OpenOutcome::RemoteClosed;
                    }
                    Err(e) => {
                        self.shared.update(|view| view.last_error = Some(e.to_string()));
                        break OpenOutcome::RemoteClosed;
                    }
                },
                Some(probe) = probes.recv() => {
                    // a probe that cannot be sent is skipped, not retried
                    if let Err(e) = writer.send_text(codec::encode(&probe)).await {
                        debug!("Health check for job {} dropped: {}", self.job_id, e);
                    }
                },
                command = commands.recv() => match command {
                    Some(SessionCommand::Send(command)) => {
                        if let Err(e) = writer.send_text(codec::encode(&command)).await {
                            warn!("Failed to send command for job {}: {}", self.job_id, e);
                        }
                    }
                    Some(SessionCommand::Connect) => {
                        debug!("Connect ignored for job {}: channel already open", self.job_id);
                    }
                    Some(SessionCommand::Disconnect) => break OpenOutcome::Disconnected,
                    None => break OpenOutcome::Shutdown,
                },
            }
        };

        monitor.abort();

        if matches!(outcome, OpenOutcome::Disconnected | OpenOutcome::Shutdown) {
            self.state.send_replace(SessionState::Closing);
            writer.close().await;
        }

        self.shared
            .update(|view| view.connectivity = Connectivity::Disconnected);

        outcome
    }
}

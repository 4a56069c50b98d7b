//! Job observation handlers
//!
//! Handles the live `watch` command plus the one-shot `status` and `logs`
//! snapshot commands. All three drive the same streaming session; the
//! one-shot variants disconnect as soon as their answer arrives.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Args;
use colored::*;
use uuid::Uuid;

use spyglass_client::{
    Connectivity, JobSession, JobSnapshot, JobStatus, JobView, LogEntry, LogLevel, SessionState,
};

use crate::config::Config;

/// Arguments for the watch command
#[derive(Args)]
pub struct WatchArgs {
    /// Job ID
    pub id: Uuid,

    /// Give up if the job has not finished after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Follow a job live until it reaches a terminal state
pub async fn watch_job(args: WatchArgs, config: &Config) -> Result<()> {
    let session = open_session(args.id, config)?;

    println!("{}", format!("Watching job {}:", args.id).bold());

    let mut printer = ViewPrinter::new();
    let mut updates = session.watch_updates();
    let mut states = session.watch_state();
    let deadline = args
        .timeout
        .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

    loop {
        let view = session.view();
        printer.render(&view);

        if view.is_terminal {
            session.disconnect();
            return finish(&view);
        }

        if session.state() == SessionState::Failed {
            let reason = view
                .last_error
                .unwrap_or_else(|| "connection failed".to_string());
            bail!("Lost the job stream: {reason}");
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    bail!("Session ended unexpectedly");
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    bail!("Session ended unexpectedly");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n{}", "Interrupted, disconnecting...".yellow());
                session.disconnect();
                return Ok(());
            }
            _ = wait_deadline(deadline) => {
                session.disconnect();
                bail!("Timed out waiting for the job to finish");
            }
        }
    }
}

/// Print a one-shot status snapshot
pub async fn print_status(id: Uuid, config: &Config) -> Result<()> {
    let session = open_session(id, config)?;

    wait_for(&session, |view| view.connectivity == Connectivity::Connected).await?;
    session.request_status();
    let view = wait_for(&session, |view| view.snapshot.is_some()).await?;
    session.disconnect();

    let Some(snapshot) = view.snapshot else {
        bail!("Server never answered the status request");
    };
    print_job_details(&snapshot);
    Ok(())
}

/// Print the current log tail
pub async fn print_logs(id: Uuid, config: &Config) -> Result<()> {
    let session = open_session(id, config)?;

    wait_for(&session, |view| view.connectivity == Connectivity::Connected).await?;
    session.request_logs();

    // an active job may legitimately have no logs yet, so a quiet stream is
    // not an error; give the snapshot a moment to arrive
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    let mut updates = session.watch_updates();
    while session.view().logs.is_empty() {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::time::sleep_until(deadline) => break,
        }
    }

    let view = session.view();
    session.disconnect();

    if view.logs.is_empty() {
        println!("{}", "No logs found for this job.".yellow());
    } else {
        println!("{}", format!("Logs for job {id}:").bold());
        println!("{}", "─".repeat(80).dimmed());
        for log in &view.logs {
            print_log_entry(log);
        }
        println!("{}", "─".repeat(80).dimmed());
    }

    Ok(())
}

fn open_session(id: Uuid, config: &Config) -> Result<JobSession> {
    let session_config = config.session_config();
    session_config.validate()?;

    let session = JobSession::new(session_config, id);
    session.connect();
    Ok(session)
}

async fn wait_for(session: &JobSession, predicate: impl Fn(&JobView) -> bool) -> Result<JobView> {
    let mut updates = session.watch_updates();
    let wait = async {
        loop {
            let view = session.view();
            if predicate(&view) {
                return Ok(view);
            }
            if session.state() == SessionState::Failed {
                let reason = view
                    .last_error
                    .unwrap_or_else(|| "connection failed".to_string());
                bail!("Could not reach the job stream: {reason}");
            }
            if updates.changed().await.is_err() {
                bail!("Session ended unexpectedly");
            }
        }
    };

    match tokio::time::timeout(Duration::from_secs(30), wait).await {
        Ok(result) => result,
        Err(_) => bail!("Timed out waiting for the server to answer"),
    }
}

async fn wait_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn finish(view: &JobView) -> Result<()> {
    let status = match view.status {
        Some(status) => colorize_status(&status),
        None => "finished".normal(),
    };
    println!();
    println!(
        "{} Job finished: {} ({} log line(s), {} result(s))",
        "▸".cyan(),
        status,
        view.logs.len(),
        view.results.len()
    );

    if let Some(error) = &view.last_error {
        println!("  Last reported error: {}", error.red());
    }

    match view.status {
        Some(JobStatus::Failed) => bail!("Job failed"),
        _ => Ok(()),
    }
}

/// Incremental printer that only emits what changed since the last render
struct ViewPrinter {
    printed_logs: usize,
    printed_results: usize,
    last_status: Option<JobStatus>,
    last_progress: Option<u8>,
    last_connectivity: Connectivity,
}

impl ViewPrinter {
    fn new() -> Self {
        Self {
            printed_logs: 0,
            printed_results: 0,
            last_status: None,
            last_progress: None,
            last_connectivity: Connectivity::Disconnected,
        }
    }

    fn render(&mut self, view: &JobView) {
        if view.connectivity != self.last_connectivity {
            match view.connectivity {
                Connectivity::Connected => {
                    println!("{}", "✓ Connected".green());
                }
                Connectivity::Disconnected => {
                    println!("{}", "⚠ Connection lost".yellow());
                }
            }
            self.last_connectivity = view.connectivity;
        }

        if view.status != self.last_status {
            if let Some(status) = view.status {
                println!("  Status:   {}", colorize_status(&status));
            }
            self.last_status = view.status;
        }

        if self.last_progress != Some(view.progress) {
            let step = view.current_step.as_deref().unwrap_or("");
            println!(
                "  Progress: {} {}",
                format!("{:>3}%", view.progress).cyan(),
                step.dimmed()
            );
            self.last_progress = Some(view.progress);
        }

        // a bulk snapshot may have replaced history with a shorter one
        if view.logs.len() < self.printed_logs {
            self.printed_logs = 0;
        }
        for log in &view.logs[self.printed_logs..] {
            print_log_entry(log);
        }
        self.printed_logs = view.logs.len();

        for result in &view.results[self.printed_results..] {
            println!("  {} {}", "Result:".bold(), result);
        }
        self.printed_results = view.results.len();
    }
}

/// Print detailed job information
fn print_job_details(snapshot: &JobSnapshot) {
    println!("{}", "Job Details:".bold());
    println!("  ID:        {}", snapshot.id.to_string().cyan());
    println!("  Name:      {}", snapshot.name);
    println!("  Status:    {}", colorize_status(&snapshot.status));
    println!("  Progress:  {}%", snapshot.progress);

    if let Some(step) = &snapshot.current_step {
        match snapshot.total_steps {
            Some(total) => println!("  Step:      {step} (of {total})"),
            None => println!("  Step:      {step}"),
        }
    }

    if let Some(started) = snapshot.started_at {
        println!("  Started:   {}", started.format("%Y-%m-%d %H:%M:%S"));
    }

    if let Some(completed) = snapshot.completed_at {
        println!("  Completed: {}", completed.format("%Y-%m-%d %H:%M:%S"));

        if let Some(started) = snapshot.started_at {
            let duration = completed.signed_duration_since(started);
            println!("  Duration:  {}s", duration.num_seconds());
        }
    }
}

/// Print a log entry
fn print_log_entry(log: &LogEntry) {
    let level_str = format!("{:?}", log.level).to_uppercase();
    let level_colored = match log.level {
        LogLevel::Debug => level_str.dimmed(),
        LogLevel::Info => level_str.cyan(),
        LogLevel::Warning => level_str.yellow(),
        LogLevel::Error => level_str.red(),
        LogLevel::Critical => level_str.red().bold(),
    };

    println!(
        "{} [{}] {}",
        log.timestamp.format("%H:%M:%S").to_string().dimmed(),
        level_colored,
        log.message
    );
}

/// Colorize job status for display
fn colorize_status(status: &JobStatus) -> colored::ColoredString {
    let status_str = format!("{status:?}");
    match status {
        JobStatus::Pending => status_str.yellow(),
        JobStatus::Running => status_str.cyan(),
        JobStatus::Paused => status_str.yellow(),
        JobStatus::Completed => status_str.green(),
        JobStatus::Failed => status_str.red(),
        JobStatus::Cancelled => status_str.dimmed(),
    }
}

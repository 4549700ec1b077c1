//! Tracker subprocess manager
//!
//! Launches the external pose tracker script as a child process that is
//! killed when the manager is dropped. Crash recovery is polled from the
//! frame loop against a deadline, so a pending restart never blocks a frame.

use std::time::{Duration, Instant};
use tokio::process::{Child, Command};

use crate::config::TrackingConfig;
use crate::error::{StageError, TrackingError};

/// Outcome of one `poll_restart` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartStatus {
    /// Never launched, stopped, or auto-restart disabled
    Idle,
    Running,
    /// Down, waiting for the restart deadline
    Pending,
    Restarted,
    /// Relaunch failed; another attempt is scheduled
    Failed,
}

/// Manages the pose tracker subprocess
pub struct TrackerProcess {
    child: Option<Child>,
    config: TrackingConfig,
    program: String,
    /// Set by `start` (even when the spawn fails), cleared by `stop`
    launched: bool,
    restart_at: Option<Instant>,
}

impl TrackerProcess {
    /// Create a new subprocess manager (does not start the process)
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            child: None,
            config: config.clone(),
            program: "python3".to_string(),
            launched: false,
            restart_at: None,
        }
    }

    /// Override the interpreter used to run the tracker script
    pub fn with_program(mut self, program: &str) -> Self {
        self.set_program(program);
        self
    }

    pub fn set_program(&mut self, program: &str) {
        self.program = program.to_string();
    }

    /// Command-line arguments passed after the program name
    pub fn args(&self) -> Vec<String> {
        vec![
            self.config.tracker_script.clone(),
            "--ip".to_string(),
            self.config.listen_address.clone(),
            "--port".to_string(),
            self.config.port.to_string(),
            "--capture".to_string(),
            self.config.camera_device.to_string(),
        ]
    }

    /// Launch the tracker.
    ///
    /// Runs: `python3 <tracker_script> --ip <listen_address> --port <port>
    ///        --capture <camera_device>`
    pub fn start(&mut self) -> Result<(), StageError> {
        if self.is_running() {
            return Ok(());
        }
        self.launched = true;

        let child = Command::new(&self.program)
            .args(self.args())
            .kill_on_drop(true)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| {
                TrackingError::Subprocess(format!(
                    "Failed to launch tracker at '{}': {}",
                    self.config.tracker_script, e
                ))
            })?;

        tracing::info!(
            "Tracker subprocess started (pid: {:?}, camera: {}, port: {})",
            child.id(),
            self.config.camera_device,
            self.config.port,
        );

        self.child = Some(child);
        Ok(())
    }

    /// Check if the subprocess is still running (non-blocking)
    pub fn is_running(&mut self) -> bool {
        match &mut self.child {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(status)) => {
                    tracing::warn!("Tracker subprocess exited with: {}", status);
                    self.child = None;
                    false
                }
                Err(e) => {
                    tracing::error!("Failed to check tracker subprocess status: {}", e);
                    false
                }
            },
            None => false,
        }
    }

    /// Restart after a crash once `restart_delay_secs` has elapsed.
    ///
    /// Never waits: the first call after the tracker goes down schedules the
    /// restart, later calls relaunch once `now` reaches the deadline. A
    /// failed relaunch schedules the next attempt.
    pub fn poll_restart(&mut self, now: Instant) -> RestartStatus {
        if !self.launched || !self.config.auto_restart {
            return RestartStatus::Idle;
        }
        if self.is_running() {
            self.restart_at = None;
            return RestartStatus::Running;
        }

        let delay = Duration::from_secs(self.config.restart_delay_secs);
        let deadline = match self.restart_at {
            Some(deadline) => deadline,
            None => {
                tracing::info!(
                    "Tracker subprocess down, restarting in {}s",
                    self.config.restart_delay_secs
                );
                let deadline = now + delay;
                self.restart_at = Some(deadline);
                deadline
            }
        };
        if now < deadline {
            return RestartStatus::Pending;
        }

        match self.start() {
            Ok(()) => {
                self.restart_at = None;
                RestartStatus::Restarted
            }
            Err(e) => {
                tracing::error!(
                    "Failed to restart tracker, retrying in {}s: {}",
                    self.config.restart_delay_secs,
                    e
                );
                self.restart_at = Some(now + delay);
                RestartStatus::Failed
            }
        }
    }

    /// Stop the subprocess by killing it
    pub async fn stop(&mut self) {
        self.launched = false;
        self.restart_at = None;
        if let Some(mut child) = self.child.take() {
            tracing::info!("Stopping tracker subprocess (pid: {:?})", child.id());
            let _ = child.kill().await;
            let _ = child.wait().await;
        }
    }
}

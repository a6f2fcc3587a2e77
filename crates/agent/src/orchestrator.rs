//! End-to-end sequencing of a single run.
//!
//! `Start -> Connecting -> ArmingDelay -> Monitoring -> {Notifying | Idle} -> Done`
//!
//! An unavailable host ends the run early but cleanly. Monitoring and
//! delivery failures are returned to `main`, which exits non-zero.

use std::time::Duration;

use chrono::Local;
use rendermail_core::types::CompletedJobSet;
use rendermail_host::connector::{HostConnector, HostError};
use rendermail_notify::email::{MailTransport, Notifier, NotifyError};
use rendermail_notify::message::Message;

use crate::monitor::{LogProgress, MonitorError, MonitorOutcome, ProgressSink, RenderMonitor};

/// Window given to the operator to start render jobs after launching us.
pub const DEFAULT_ARMING_DELAY: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Start,
    Connecting,
    ArmingDelay,
    Monitoring,
    Notifying,
    Idle,
    Done,
}

/// How a run that did not fail ended. All of these exit with status 0.
#[derive(Debug)]
pub enum RunOutcome {
    HostUnavailable(String),
    Idle,
    Notified {
        jobs: CompletedJobSet,
        message: Message,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl RunError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, RunError::Notify(e) if e.is_authentication())
    }

    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

pub struct Orchestrator<'a, T> {
    connector: HostConnector,
    monitor: RenderMonitor,
    notifier: Notifier<'a, T>,
    arming_delay: Duration,
    state: RunState,
}

impl<'a, T: MailTransport> Orchestrator<'a, T> {
    pub fn new(
        connector: HostConnector,
        monitor: RenderMonitor,
        notifier: Notifier<'a, T>,
        arming_delay: Duration,
    ) -> Self {
        Self {
            connector,
            monitor,
            notifier,
            arming_delay,
            state: RunState::Start,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn notifier(&self) -> &Notifier<'a, T> {
        &self.notifier
    }

    /// Run once, logging progress to the operator log.
    pub async fn run(&mut self) -> Result<RunOutcome, RunError> {
        self.run_with(&mut LogProgress).await
    }

    /// Run once, sending progress observations to `sink`.
    pub async fn run_with(&mut self, sink: &mut dyn ProgressSink) -> Result<RunOutcome, RunError> {
        self.transition(RunState::Connecting);
        let connected = match self.connector.connect().await {
            Ok(connected) => connected,
            Err(HostError::Unavailable(reason)) => {
                tracing::warn!("{reason}");
                self.transition(RunState::Done);
                return Ok(RunOutcome::HostUnavailable(reason));
            }
        };
        tracing::info!("{}", connected.status);

        self.transition(RunState::ArmingDelay);
        tokio::time::sleep(self.arming_delay).await;

        self.transition(RunState::Monitoring);
        let outcome = self.monitor.watch(connected.handle.project(), sink).await?;

        match outcome {
            MonitorOutcome::Idle => {
                self.transition(RunState::Idle);
                tracing::info!("No renders in progress. Exiting.");
                self.transition(RunState::Done);
                Ok(RunOutcome::Idle)
            }
            MonitorOutcome::Completed(jobs) => {
                self.transition(RunState::Notifying);
                let message = self.notifier.notify(&jobs, &Local::now()).await?;
                self.transition(RunState::Done);
                Ok(RunOutcome::Notified { jobs, message })
            }
        }
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "Run state change");
        self.state = next;
    }
}

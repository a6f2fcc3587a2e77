//! Render-queue monitoring.
//!
//! [`RenderMonitor::watch`] waits until nothing in the project's queue is
//! rendering and reports which jobs were seen leaving the Rendering
//! state. Jobs are polled one at a time in the order the host lists them:
//! a later job is not looked at until every earlier one has stopped
//! rendering.
//!
//! Without a `max_wait` a job that never leaves Rendering blocks the pass
//! forever.

use std::time::Duration;

use rendermail_core::engine::RenderProject;
use rendermail_core::error::EngineError;
use rendermail_core::types::{CompletedJobSet, JobStatus, JobStatusReport, RenderJob};
use tokio::time::Instant;

/// Pause between two status queries of the same job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// One status poll of a job, as shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressObservation {
    pub job: RenderJob,
    pub report: JobStatusReport,
}

/// Receives every progress observation made during a pass.
pub trait ProgressSink: Send {
    fn observe(&mut self, observation: &ProgressObservation);
}

/// Writes observations to the operator log.
#[derive(Debug, Default)]
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn observe(&mut self, observation: &ProgressObservation) {
        let ProgressObservation { job, report } = observation;
        if report.status.is_rendering() {
            tracing::info!(
                job_index = %job.index,
                "Rendering {} {}%",
                job.name,
                report.completion_percentage,
            );
        } else {
            tracing::info!(job_index = %job.index, status = %report.status, "Finished {}", job.name);
        }
    }
}

impl ProgressSink for Vec<ProgressObservation> {
    fn observe(&mut self, observation: &ProgressObservation) {
        self.push(observation.clone());
    }
}

#[derive(Debug)]
pub enum MonitorOutcome {
    /// Nothing was rendering when the pass started.
    Idle,
    Completed(CompletedJobSet),
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Render engine query failed: {0}")]
    Engine(#[from] EngineError),

    #[error("Gave up on '{job}' after waiting {waited:?} for renders to finish")]
    WaitExceeded { job: String, waited: Duration },
}

pub struct RenderMonitor {
    poll_interval: Duration,
    max_wait: Option<Duration>,
}

impl Default for RenderMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl RenderMonitor {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            max_wait: None,
        }
    }

    /// Bound the whole pass. `None` keeps the unbounded behaviour.
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Run one monitoring pass over `project`'s render queue.
    pub async fn watch(
        &self,
        project: &dyn RenderProject,
        sink: &mut dyn ProgressSink,
    ) -> Result<MonitorOutcome, MonitorError> {
        if !project.is_rendering_in_progress().await? {
            return Ok(MonitorOutcome::Idle);
        }

        let jobs = project.render_jobs().await?;
        tracing::debug!(project = project.name(), job_count = jobs.len(), "Watching render queue");

        let started = Instant::now();
        let mut completed = CompletedJobSet::new();

        for job in &jobs {
            if let Some(status) = self.wait_for_job(project, job, sink, started).await? {
                completed.insert(job.name.clone(), status);
            }
        }

        tracing::info!(completed = completed.len(), "All renders are complete.");
        Ok(MonitorOutcome::Completed(completed))
    }

    /// Poll one job until it is not rendering.
    ///
    /// Returns the status it left in, or `None` if it was never seen
    /// rendering (already finished, or still queued, when we got to it).
    async fn wait_for_job(
        &self,
        project: &dyn RenderProject,
        job: &RenderJob,
        sink: &mut dyn ProgressSink,
        started: Instant,
    ) -> Result<Option<JobStatus>, MonitorError> {
        let mut seen_rendering = false;

        loop {
            let report = project.render_job_status(job.index).await?;

            if !report.status.is_rendering() {
                if seen_rendering {
                    sink.observe(&ProgressObservation {
                        job: job.clone(),
                        report,
                    });
                    return Ok(Some(report.status));
                }
                return Ok(None);
            }

            seen_rendering = true;
            sink.observe(&ProgressObservation {
                job: job.clone(),
                report,
            });

            if let Some(max_wait) = self.max_wait {
                let waited = started.elapsed();
                if waited >= max_wait {
                    return Err(MonitorError::WaitExceeded {
                        job: job.name.clone(),
                        waited,
                    });
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

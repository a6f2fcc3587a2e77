//! Scripted doubles shared by the agent integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rendermail_agent::monitor::{ProgressObservation, RenderMonitor};
use rendermail_agent::orchestrator::Orchestrator;
use rendermail_core::engine::{ProjectManager, RenderEngine, RenderProject};
use rendermail_core::error::EngineError;
use rendermail_core::types::{JobIndex, JobStatus, JobStatusReport, RenderJob};
use rendermail_host::connector::{Bootstrap, HostConnector};
use rendermail_notify::email::{MailConfig, MailTransport, Notifier, NotifyError};
use rendermail_notify::message::Message;

// ---------------------------------------------------------------------------
// Render engine
// ---------------------------------------------------------------------------

/// Progress sink that keeps every observation.
pub type Observations = Vec<ProgressObservation>;

pub fn rendering(percent: u8) -> JobStatusReport {
    JobStatusReport::rendering(percent)
}

pub fn finished(status: JobStatus) -> JobStatusReport {
    JobStatusReport::finished(status)
}

struct ScriptedJob {
    job: RenderJob,
    /// Remaining answers; the last one repeats forever.
    statuses: VecDeque<JobStatusReport>,
}

/// A project whose jobs answer status queries from a fixed script.
pub struct ScriptedProject {
    in_progress: bool,
    jobs: Mutex<Vec<ScriptedJob>>,
    failing_job: Option<JobIndex>,
    status_queries: Mutex<Vec<JobIndex>>,
}

impl ScriptedProject {
    pub fn idle() -> Self {
        Self::new(false, &[])
    }

    pub fn rendering(jobs: &[(&str, &[JobStatusReport])]) -> Self {
        Self::new(true, jobs)
    }

    fn new(in_progress: bool, jobs: &[(&str, &[JobStatusReport])]) -> Self {
        let jobs = jobs
            .iter()
            .enumerate()
            .map(|(i, (name, statuses))| ScriptedJob {
                job: RenderJob {
                    index: JobIndex(i as u32 + 1),
                    name: name.to_string(),
                },
                statuses: statuses.iter().copied().collect(),
            })
            .collect();

        Self {
            in_progress,
            jobs: Mutex::new(jobs),
            failing_job: None,
            status_queries: Mutex::new(Vec::new()),
        }
    }

    /// Make status queries for `index` fail.
    pub fn failing_on(mut self, index: JobIndex) -> Self {
        self.failing_job = Some(index);
        self
    }

    /// Indices passed to `render_job_status`, in call order.
    pub fn status_queries(&self) -> Vec<JobIndex> {
        self.status_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RenderProject for ScriptedProject {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn is_rendering_in_progress(&self) -> Result<bool, EngineError> {
        Ok(self.in_progress)
    }

    async fn render_jobs(&self) -> Result<Vec<RenderJob>, EngineError> {
        Ok(self.jobs.lock().unwrap().iter().map(|j| j.job.clone()).collect())
    }

    async fn render_job_status(&self, index: JobIndex) -> Result<JobStatusReport, EngineError> {
        self.status_queries.lock().unwrap().push(index);

        if self.failing_job == Some(index) {
            return Err(EngineError::Api {
                status: 500,
                body: "scripting bridge crashed".into(),
            });
        }

        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.job.index == index)
            .ok_or_else(|| EngineError::Decode(format!("no job {index}")))?;

        let report = if job.statuses.len() > 1 {
            job.statuses.pop_front()
        } else {
            job.statuses.front().copied()
        };
        report.ok_or_else(|| EngineError::Decode(format!("job {index} has no script")))
    }
}

/// Engine and project manager over a single [`ScriptedProject`].
#[derive(Clone)]
pub struct ScriptedEngine {
    project: Option<Arc<ScriptedProject>>,
}

impl ScriptedEngine {
    pub fn with_project(project: Arc<ScriptedProject>) -> Self {
        Self {
            project: Some(project),
        }
    }
}

#[async_trait]
impl RenderEngine for ScriptedEngine {
    async fn project_manager(&self) -> Result<Arc<dyn ProjectManager>, EngineError> {
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl ProjectManager for ScriptedEngine {
    async fn current_project(&self) -> Result<Option<Arc<dyn RenderProject>>, EngineError> {
        Ok(self
            .project
            .clone()
            .map(|p| p as Arc<dyn RenderProject>))
    }
}

/// Bootstrap that never finds the host.
pub struct NoHost;

#[async_trait]
impl Bootstrap for NoHost {
    async fn bootstrap(&self) -> Result<Arc<dyn RenderEngine>, EngineError> {
        Err(EngineError::Request("connection refused".into()))
    }
}

pub fn connector_for(project: Arc<ScriptedProject>) -> HostConnector {
    HostConnector::new(
        Some(Arc::new(ScriptedEngine::with_project(project))),
        Box::new(NoHost),
    )
}

// ---------------------------------------------------------------------------
// Mail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub enum MailBehaviour {
    Accept,
    RejectLogin,
    Unreachable,
}

/// Records what would have been sent and fails as instructed.
pub struct RecordingTransport {
    behaviour: MailBehaviour,
    pub sent: Mutex<Vec<(Vec<String>, Message)>>,
}

impl RecordingTransport {
    pub fn new(behaviour: MailBehaviour) -> Self {
        Self {
            behaviour,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn deliver(
        &self,
        _sender: &str,
        recipients: &[String],
        message: &Message,
    ) -> Result<(), NotifyError> {
        match self.behaviour {
            MailBehaviour::Accept => {
                self.sent
                    .lock()
                    .unwrap()
                    .push((recipients.to_vec(), message.clone()));
                Ok(())
            }
            MailBehaviour::RejectLogin => Err(NotifyError::Authentication(
                "535 5.7.8 Username and Password not accepted".into(),
            )),
            MailBehaviour::Unreachable => Err(NotifyError::Transport("connection refused".into())),
        }
    }
}

pub fn mail_config() -> MailConfig {
    MailConfig {
        smtp_host: "smtp.example.com".into(),
        smtp_port: 587,
        username: "render@example.com".into(),
        password: "secret".into(),
        sender: "render@example.com".into(),
        recipients: vec!["ops@example.com".into()],
        report_outcomes: false,
    }
}

/// Monitor with no pause between polls.
pub fn fast_monitor() -> RenderMonitor {
    RenderMonitor::new(Duration::ZERO)
}

pub fn orchestrator<'a>(
    connector: HostConnector,
    config: &'a MailConfig,
    behaviour: MailBehaviour,
) -> Orchestrator<'a, RecordingTransport> {
    Orchestrator::new(
        connector,
        fast_monitor(),
        Notifier::new(config, RecordingTransport::new(behaviour)),
        Duration::ZERO,
    )
}

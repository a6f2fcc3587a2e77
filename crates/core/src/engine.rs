//! Capability traits for the host render engine.
//!
//! These mirror the host's scripting surface: an engine handle yields a
//! project manager, which yields the current project, which exposes the
//! render queue. Implementations live in `rendermail-host`; tests supply
//! scripted doubles.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::{JobIndex, JobStatusReport, RenderJob};

#[async_trait]
pub trait RenderEngine: Send + Sync {
    async fn project_manager(&self) -> Result<Arc<dyn ProjectManager>, EngineError>;
}

#[async_trait]
pub trait ProjectManager: Send + Sync {
    /// The project open in the host, or `None` when nothing is open.
    async fn current_project(&self) -> Result<Option<Arc<dyn RenderProject>>, EngineError>;
}

/// Read-only view of a project's render queue.
#[async_trait]
pub trait RenderProject: Send + Sync {
    fn name(&self) -> &str;

    async fn is_rendering_in_progress(&self) -> Result<bool, EngineError>;

    /// Every job in the queue, in the order the host lists them.
    async fn render_jobs(&self) -> Result<Vec<RenderJob>, EngineError>;

    async fn render_job_status(&self, index: JobIndex) -> Result<JobStatusReport, EngineError>;
}

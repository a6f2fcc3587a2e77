//! Acquisition of a live handle to the render engine.
//!
//! Two sources are tried in order: a capability injected by the host when
//! we run inside its scripting console, then an external bootstrap. The
//! choice is made by [`HostConnector::resolve`] and returned as an
//! [`Acquisition`] rather than signalled through errors.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use rendermail_core::engine::{ProjectManager, RenderEngine, RenderProject};
use rendermail_core::error::EngineError;

/// Status reported when the injected capability was used.
pub const STATUS_IN_PROCESS: &str = "Created Resolve instances.";

/// Status reported when the external bootstrap was used.
pub const STATUS_BOOTSTRAPPED: &str = "Created Resolve instances via bootstrap.";

/// Produces an engine handle from outside the host process.
#[async_trait]
pub trait Bootstrap: Send + Sync {
    async fn bootstrap(&self) -> Result<Arc<dyn RenderEngine>, EngineError>;
}

/// Which acquisition path yielded an engine, if any.
pub enum Acquisition {
    InProcess(Arc<dyn RenderEngine>),
    Bootstrapped(Arc<dyn RenderEngine>),
    Unavailable(String),
}

impl fmt::Debug for Acquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acquisition::InProcess(_) => f.write_str("InProcess(..)"),
            Acquisition::Bootstrapped(_) => f.write_str("Bootstrapped(..)"),
            Acquisition::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Render engine unavailable: {0}")]
    Unavailable(String),
}

/// Engine, project manager and current project, resolved once per run.
pub struct EngineHandle {
    engine: Arc<dyn RenderEngine>,
    project_manager: Arc<dyn ProjectManager>,
    project: Arc<dyn RenderProject>,
}

impl EngineHandle {
    pub fn engine(&self) -> &dyn RenderEngine {
        self.engine.as_ref()
    }

    pub fn project_manager(&self) -> &dyn ProjectManager {
        self.project_manager.as_ref()
    }

    pub fn project(&self) -> &dyn RenderProject {
        self.project.as_ref()
    }
}

/// A successful connection plus the line to show the operator.
pub struct Connected {
    pub handle: EngineHandle,
    pub status: String,
}

pub struct HostConnector {
    injected: Option<Arc<dyn RenderEngine>>,
    bootstrap: Box<dyn Bootstrap>,
}

impl HostConnector {
    /// * `injected`  - capability handed over by the host console, if any.
    /// * `bootstrap` - fallback used when nothing was injected.
    pub fn new(injected: Option<Arc<dyn RenderEngine>>, bootstrap: Box<dyn Bootstrap>) -> Self {
        Self {
            injected,
            bootstrap,
        }
    }

    /// Pick an engine source without touching any project state.
    pub async fn resolve(&self) -> Acquisition {
        if let Some(engine) = &self.injected {
            return Acquisition::InProcess(Arc::clone(engine));
        }

        match self.bootstrap.bootstrap().await {
            Ok(engine) => Acquisition::Bootstrapped(engine),
            Err(e) => Acquisition::Unavailable(format!(
                "Unable to find the Resolve scripting API. Is Resolve Studio running? ({e})"
            )),
        }
    }

    /// Resolve an engine, then its project manager and current project.
    ///
    /// Performed once per run; callers decide whether to try again.
    pub async fn connect(&self) -> Result<Connected, HostError> {
        let (engine, status) = match self.resolve().await {
            Acquisition::InProcess(engine) => (engine, STATUS_IN_PROCESS),
            Acquisition::Bootstrapped(engine) => (engine, STATUS_BOOTSTRAPPED),
            Acquisition::Unavailable(reason) => return Err(HostError::Unavailable(reason)),
        };

        let project_manager = engine
            .project_manager()
            .await
            .map_err(|e| HostError::Unavailable(format!("Project manager unavailable: {e}")))?;

        let project = project_manager
            .current_project()
            .await
            .map_err(|e| HostError::Unavailable(format!("Current project unavailable: {e}")))?
            .ok_or_else(|| HostError::Unavailable("No project is open in Resolve.".to_string()))?;

        tracing::debug!(project = project.name(), "Resolved current project");

        Ok(Connected {
            handle: EngineHandle {
                engine,
                project_manager,
                project,
            },
            status: status.to_string(),
        })
    }
}

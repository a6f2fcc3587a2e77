//! HTTP client for the render engine's scripting bridge.
//!
//! The bridge exposes the host's project and render-queue API as JSON
//! over HTTP, keeping the host's own field names (`RenderJobName`,
//! `JobStatus`, `CompletionPercentage`). [`ResolveBridge`] implements the
//! engine capability traits on top of it using [`reqwest`].

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rendermail_core::engine::{ProjectManager, RenderEngine, RenderProject};
use rendermail_core::error::EngineError;
use rendermail_core::types::{JobIndex, JobStatusReport, RenderJob};
use serde::Deserialize;

use crate::connector::Bootstrap;

/// Default bridge address used when bootstrapping from outside the host.
pub const DEFAULT_BRIDGE_URL: &str = "http://127.0.0.1:9237";

/// Client for one scripting-bridge endpoint.
#[derive(Clone)]
pub struct ResolveBridge {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    name: String,
}

#[derive(Debug, Deserialize)]
struct InProgressRecord {
    in_progress: bool,
}

#[derive(Debug, Deserialize)]
struct JobRecord {
    #[serde(rename = "RenderJobName")]
    name: String,
}

impl ResolveBridge {
    /// * `base_url` - Bridge root, e.g. `http://127.0.0.1:9237`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check the bridge answers at all.
    pub async fn ping(&self) -> Result<(), EngineError> {
        let response = self.get("/ping").await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    // ---- private helpers ----

    async fn get(&self, path: &str) -> Result<reqwest::Response, EngineError> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| EngineError::Request(e.to_string()))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, EngineError> {
        let response = Self::ensure_success(self.get(path).await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))
    }

    /// Turn a non-2xx response into [`EngineError::Api`] carrying the body.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, EngineError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(EngineError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RenderEngine for ResolveBridge {
    async fn project_manager(&self) -> Result<Arc<dyn ProjectManager>, EngineError> {
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl ProjectManager for ResolveBridge {
    async fn current_project(&self) -> Result<Option<Arc<dyn RenderProject>>, EngineError> {
        let response = self.get("/project").await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let record: Option<ProjectRecord> = Self::ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        Ok(record.map(|r| {
            Arc::new(BridgeProject {
                bridge: self.clone(),
                name: r.name,
            }) as Arc<dyn RenderProject>
        }))
    }
}

/// The project currently open in the host, as seen through the bridge.
pub struct BridgeProject {
    bridge: ResolveBridge,
    name: String,
}

#[async_trait]
impl RenderProject for BridgeProject {
    fn name(&self) -> &str {
        &self.name
    }

    async fn is_rendering_in_progress(&self) -> Result<bool, EngineError> {
        let record: InProgressRecord = self.bridge.get_json("/project/render/in-progress").await?;
        Ok(record.in_progress)
    }

    async fn render_jobs(&self) -> Result<Vec<RenderJob>, EngineError> {
        let table: BTreeMap<u32, JobRecord> = self.bridge.get_json("/project/render/jobs").await?;
        Ok(jobs_from_table(table))
    }

    async fn render_job_status(&self, index: JobIndex) -> Result<JobStatusReport, EngineError> {
        self.bridge
            .get_json(&format!("/project/render/jobs/{index}/status"))
            .await
    }
}

fn jobs_from_table(table: BTreeMap<u32, JobRecord>) -> Vec<RenderJob> {
    table
        .into_iter()
        .map(|(index, record)| RenderJob {
            index: JobIndex(index),
            name: record.name,
        })
        .collect()
}

/// Bootstraps a bridge connection from outside the host by probing the
/// configured endpoint.
pub struct BridgeBootstrap {
    base_url: String,
}

impl BridgeBootstrap {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Bootstrap for BridgeBootstrap {
    async fn bootstrap(&self) -> Result<Arc<dyn RenderEngine>, EngineError> {
        let bridge = ResolveBridge::new(self.base_url.as_str());
        bridge.ping().await?;
        tracing::debug!(base_url = bridge.base_url(), "Scripting bridge answered");
        Ok(Arc::new(bridge))
    }
}

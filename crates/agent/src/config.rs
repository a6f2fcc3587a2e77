use std::sync::Arc;
use std::time::Duration;

use rendermail_core::engine::RenderEngine;
use rendermail_core::env;
use rendermail_core::error::ConfigError;
use rendermail_host::bridge::{ResolveBridge, DEFAULT_BRIDGE_URL};
use rendermail_notify::email::MailConfig;

use crate::monitor::DEFAULT_POLL_INTERVAL;
use crate::orchestrator::DEFAULT_ARMING_DELAY;

/// Process configuration, loaded once at start.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Pause between connecting and the first queue check.
    pub arming_delay: Duration,
    /// Pause between status polls of a rendering job.
    pub poll_interval: Duration,
    /// Upper bound on one monitoring pass. `None` waits forever.
    pub max_wait: Option<Duration>,
    /// Scripting bridge used when bootstrapping from outside the host.
    pub bridge_url: String,
    /// Endpoint injected by the host's scripting console, if we were
    /// launched from it.
    pub script_endpoint: Option<String>,
    pub mail: MailConfig,
}

impl AgentConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `RENDERMAIL_ARMING_DELAY_SECS`  | `10`                    |
    /// | `RENDERMAIL_POLL_INTERVAL_SECS` | `5`                     |
    /// | `RENDERMAIL_MAX_WAIT_SECS`      | unset                   |
    /// | `RESOLVE_BRIDGE_URL`            | `http://127.0.0.1:9237` |
    /// | `RESOLVE_SCRIPT_ENDPOINT`       | unset                   |
    ///
    /// Mail settings are read by [`MailConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |var: &'static str, default: Duration| -> Result<Duration, ConfigError> {
            Ok(Duration::from_secs(env::parse_or(lookup, var, default.as_secs())?))
        };

        Ok(Self {
            arming_delay: secs("RENDERMAIL_ARMING_DELAY_SECS", DEFAULT_ARMING_DELAY)?,
            poll_interval: secs("RENDERMAIL_POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL)?,
            max_wait: env::optional_parse::<_, u64>(lookup, "RENDERMAIL_MAX_WAIT_SECS")?
                .map(Duration::from_secs),
            bridge_url: env::optional_parse(lookup, "RESOLVE_BRIDGE_URL")?
                .unwrap_or_else(|| DEFAULT_BRIDGE_URL.to_string()),
            script_endpoint: env::optional_parse(lookup, "RESOLVE_SCRIPT_ENDPOINT")?,
            mail: MailConfig::from_lookup(lookup)?,
        })
    }

    /// The engine capability handed over by the host console, if any.
    pub fn injected_engine(&self) -> Option<Arc<dyn RenderEngine>> {
        self.script_endpoint
            .as_deref()
            .map(|endpoint| Arc::new(ResolveBridge::new(endpoint)) as Arc<dyn RenderEngine>)
    }
}

//! `rendermail` -- render-completion notifier.
//!
//! Connects to the running render engine, gives the operator a moment to
//! start render jobs, watches the queue until nothing is rendering, then
//! emails the list of jobs that finished. Configuration comes from the
//! environment (see [`AgentConfig`](rendermail_agent::config::AgentConfig)).
//!
//! Exit status is 0 unless monitoring or delivery failed; a rejected SMTP
//! login exits with 1.

use std::process::ExitCode;

use rendermail_agent::config::AgentConfig;
use rendermail_agent::logging;
use rendermail_agent::monitor::RenderMonitor;
use rendermail_agent::orchestrator::{Orchestrator, RunOutcome};
use rendermail_host::bridge::BridgeBootstrap;
use rendermail_host::connector::HostConnector;
use rendermail_notify::email::{Notifier, SmtpMailer};
use tracing::Instrument;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    logging::init();

    run().instrument(tracing::info_span!(logging::RUN_SPAN)).await
}

async fn run() -> ExitCode {
    tracing::info!("Version {}", env!("CARGO_PKG_VERSION"));

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(
        bridge_url = %config.bridge_url,
        injected = config.script_endpoint.is_some(),
        poll_interval_secs = config.poll_interval.as_secs(),
        "Configuration loaded",
    );

    let connector = HostConnector::new(
        config.injected_engine(),
        Box::new(BridgeBootstrap::new(config.bridge_url.as_str())),
    );
    let monitor = RenderMonitor::new(config.poll_interval).with_max_wait(config.max_wait);
    let notifier = Notifier::new(&config.mail, SmtpMailer::new(&config.mail));

    let mut orchestrator = Orchestrator::new(connector, monitor, notifier, config.arming_delay);

    match orchestrator.run().await {
        Ok(RunOutcome::Notified { jobs, .. }) => {
            tracing::debug!(jobs = jobs.len(), "Run finished");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            // The authentication diagnostic has already been logged.
            if !e.is_authentication() {
                tracing::error!(error = %e, "Stopping on unrecovered error");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

//! Operator log contract: default filter, run tag, and the decision-point
//! lines from both the binary and the library crates.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use common::{finished, rendering, MailBehaviour, Observations, ScriptedProject};
use rendermail_agent::logging::{self, DEFAULT_FILTER, RUN_SPAN};
use rendermail_core::types::JobStatus;
use tracing::Instrument;
use tracing_subscriber::EnvFilter;

/// Target the `rendermail` binary logs under.
const BIN_TARGET: &str = "rendermail";

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn install(captured: &Captured) -> tracing::subscriber::DefaultGuard {
    let writer = captured.clone();
    tracing::subscriber::set_default(logging::subscriber(
        EnvFilter::new(DEFAULT_FILTER),
        move || writer.clone(),
    ))
}

fn run_span() -> tracing::Span {
    tracing::info_span!(target: BIN_TARGET, RUN_SPAN)
}

// ---------------------------------------------------------------------------
// Test: binary lines pass the default filter and carry the run tag
// ---------------------------------------------------------------------------

#[test]
fn default_filter_keeps_binary_lines_and_tag() {
    let captured = Captured::default();
    let _guard = install(&captured);

    let span = run_span();
    assert!(!span.is_disabled());
    span.in_scope(|| {
        tracing::info!(target: BIN_TARGET, "Version 1.0.0");
        tracing::error!(target: BIN_TARGET, "Stopping on unrecovered error");
    });

    let text = captured.text();
    assert!(text.contains("render_mail: Version 1.0.0"), "{text}");
    assert!(text.contains("render_mail: Stopping on unrecovered error"), "{text}");
}

// ---------------------------------------------------------------------------
// Test: idle run is tagged and says it is exiting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn idle_run_logs_tagged_exit_line() {
    let captured = Captured::default();
    let _guard = install(&captured);

    let config = common::mail_config();
    let project = Arc::new(ScriptedProject::idle());
    let mut run = common::orchestrator(common::connector_for(project), &config, MailBehaviour::Accept);

    run.run_with(&mut Observations::new())
        .instrument(run_span())
        .await
        .unwrap();

    let text = captured.text();
    assert!(text.contains("render_mail: Created Resolve instances."), "{text}");
    assert!(text.contains("render_mail: No renders in progress. Exiting."), "{text}");
}

// ---------------------------------------------------------------------------
// Test: rejected login logs the credentials diagnostic
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejected_login_logs_credentials_hint() {
    let captured = Captured::default();
    let _guard = install(&captured);

    let config = common::mail_config();
    let project = Arc::new(ScriptedProject::rendering(&[(
        "Intro",
        &[rendering(50), finished(JobStatus::Complete)],
    )]));
    let mut run = common::orchestrator(
        common::connector_for(project),
        &config,
        MailBehaviour::RejectLogin,
    );

    run.run_with(&mut Observations::new())
        .instrument(run_span())
        .await
        .unwrap_err();

    let text = captured.text();
    assert!(text.contains("render_mail: All renders are complete."), "{text}");
    assert!(text.contains("render_mail: Sending email."), "{text}");
    assert!(
        text.contains("render_mail: Exiting. Check your email username or password."),
        "{text}"
    );
}

//! The render-complete notification message.

use std::fmt;

use chrono::{DateTime, TimeZone};
use rendermail_core::types::{CompletedJobSet, JobStatus};

/// Subject line of every completion notification.
pub const SUBJECT: &str = "Render is complete.";

/// `asctime`-style local timestamp, e.g. `Mon Oct 19 14:05:09 2026`.
pub const TIMESTAMP_FORMAT: &str = "%a %b %e %H:%M:%S %Y";

/// A composed notification, built once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    /// Plain-text body; always sent.
    pub body: String,
    /// Optional HTML alternative. Nothing in the run fills it today.
    pub html: Option<String>,
}

impl Message {
    /// Compose the notification for a finished monitoring pass.
    ///
    /// With `report_outcomes` set, jobs that ended Failed or Cancelled are
    /// listed again underneath with their status. Otherwise every job is
    /// reported as finished, whatever state it left rendering in.
    pub fn render_complete<Tz>(jobs: &CompletedJobSet, at: &DateTime<Tz>, report_outcomes: bool) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let mut body = format!(
            "Resolve render finished at {} for the following jobs:\n{}.",
            at.format(TIMESTAMP_FORMAT),
            jobs.joined(", ")
        );

        if report_outcomes {
            let unfinished: Vec<String> = jobs
                .iter()
                .filter(|(_, status)| *status != JobStatus::Complete)
                .map(|(name, status)| format!("{name}: {status}"))
                .collect();
            if !unfinished.is_empty() {
                body.push_str("\n\nNot completed successfully:\n");
                body.push_str(&unfinished.join("\n"));
            }
        }

        Self {
            subject: SUBJECT.to_string(),
            body,
            html: None,
        }
    }
}

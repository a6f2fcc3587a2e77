//! Render-queue data model shared by the connector, monitor and notifier.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Position of a job in the host's render queue.
///
/// The host keys its job table by a 1-based integer; the value is opaque
/// to us and only ever handed back to the status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct JobIndex(pub u32);

impl fmt::Display for JobIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a render job as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum JobStatus {
    #[serde(alias = "Ready")]
    Queued,
    Rendering,
    Complete,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_rendering(self) -> bool {
        matches!(self, JobStatus::Rendering)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "Queued",
            JobStatus::Rendering => "Rendering",
            JobStatus::Complete => "Complete",
            JobStatus::Failed => "Failed",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A job entry from the project's render queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub index: JobIndex,
    pub name: String,
}

/// One answer from the host's per-job status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct JobStatusReport {
    #[serde(rename = "JobStatus")]
    pub status: JobStatus,
    /// Completion percentage (0-100).
    #[serde(rename = "CompletionPercentage", default)]
    pub completion_percentage: u8,
}

impl JobStatusReport {
    pub fn rendering(percent: u8) -> Self {
        Self {
            status: JobStatus::Rendering,
            completion_percentage: percent.min(100),
        }
    }

    pub fn finished(status: JobStatus) -> Self {
        Self {
            status,
            completion_percentage: if status == JobStatus::Complete { 100 } else { 0 },
        }
    }
}

/// Names of jobs seen leaving the Rendering state during one monitoring
/// pass, with the status each one left in.
///
/// Complete, Failed and Cancelled jobs are all members; callers that want
/// the distinction read it back through [`CompletedJobSet::outcome`].
/// Iteration is in name order, which carries no meaning beyond being
/// stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedJobSet {
    jobs: BTreeMap<String, JobStatus>,
}

impl CompletedJobSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a job. Returns `false` if a job with that name was already
    /// present (two queue entries can share a name); the latest status wins.
    pub fn insert(&mut self, name: impl Into<String>, status: JobStatus) -> bool {
        self.jobs.insert(name.into(), status).is_none()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    pub fn outcome(&self, name: &str) -> Option<JobStatus> {
        self.jobs.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, JobStatus)> {
        self.jobs.iter().map(|(name, status)| (name.as_str(), *status))
    }

    /// Job names joined with `sep`, in iteration order.
    pub fn joined(&self, sep: &str) -> String {
        self.names().collect::<Vec<_>>().join(sep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_report_decodes_host_field_names() {
        let report: JobStatusReport =
            serde_json::from_str(r#"{"JobStatus":"Rendering","CompletionPercentage":42}"#)
                .unwrap();
        assert_eq!(report, JobStatusReport::rendering(42));
    }

    #[test]
    fn ready_status_is_queued() {
        let report: JobStatusReport = serde_json::from_str(r#"{"JobStatus":"Ready"}"#).unwrap();
        assert_eq!(report.status, JobStatus::Queued);
        assert_eq!(report.completion_percentage, 0);
    }

    #[test]
    fn only_rendering_is_rendering() {
        assert!(JobStatus::Rendering.is_rendering());
        for status in [
            JobStatus::Queued,
            JobStatus::Complete,
            JobStatus::Failed,
            JobStatus::Cancelled,
        ] {
            assert!(!status.is_rendering(), "{status} should not be rendering");
        }
    }

    #[test]
    fn completed_set_merges_outcomes_but_remembers_them() {
        let mut set = CompletedJobSet::new();
        assert!(set.insert("Outro", JobStatus::Failed));
        assert!(set.insert("Intro", JobStatus::Complete));

        assert_eq!(set.len(), 2);
        assert!(set.contains("Outro"));
        assert_eq!(set.outcome("Outro"), Some(JobStatus::Failed));
        assert_eq!(set.joined(", "), "Intro, Outro");
    }

    #[test]
    fn duplicate_names_collapse() {
        let mut set = CompletedJobSet::new();
        assert!(set.insert("Intro", JobStatus::Complete));
        assert!(!set.insert("Intro", JobStatus::Cancelled));
        assert_eq!(set.len(), 1);
        assert_eq!(set.outcome("Intro"), Some(JobStatus::Cancelled));
    }
}

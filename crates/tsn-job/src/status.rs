//! Job status values.

use serde::{Deserialize, Serialize};

/// Coarse state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobKind {
    /// Not started, or stopped by cancellation.
    Stop,
    Running,
    /// The worker ran to completion. Reported as [`JobKind::Finished`]
    /// once progress has reached 100.
    Success,
    Finished,
    Failed,
}

/// Severity attached to a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Polled job status: state, severity, operator message and progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobState {
    pub kind: JobKind,
    pub severity: Severity,
    pub message: String,
    /// 0-100, monotonically non-decreasing within one run.
    pub progress: u8,
}

impl JobState {
    /// The state of a job that has never run.
    pub fn idle() -> Self {
        JobState {
            kind: JobKind::Stop,
            severity: Severity::Debug,
            message: String::new(),
            progress: 0,
        }
    }

    /// A freshly started job.
    pub fn running() -> Self {
        JobState {
            kind: JobKind::Running,
            severity: Severity::Info,
            message: String::new(),
            progress: 0,
        }
    }

    /// A worker that ran to completion.
    pub fn success() -> Self {
        JobState {
            kind: JobKind::Success,
            severity: Severity::Info,
            message: String::new(),
            progress: 0,
        }
    }

    /// A worker that observed cancellation and exited.
    pub fn stopped(message: impl Into<String>) -> Self {
        JobState {
            kind: JobKind::Stop,
            severity: Severity::Warning,
            message: message.into(),
            progress: 0,
        }
    }

    /// A worker that failed.
    pub fn failed(message: impl Into<String>) -> Self {
        JobState {
            kind: JobKind::Failed,
            severity: Severity::Error,
            message: message.into(),
            progress: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.kind == JobKind::Running
    }

    /// The state as the caller sees it: Success with progress 100 is
    /// promoted to Finished. Pure; the stored state is never rewritten.
    pub fn report(&self) -> JobState {
        let mut reported = self.clone();
        if reported.kind == JobKind::Success && reported.progress == 100 {
            reported.kind = JobKind::Finished;
        }
        reported
    }
}

impl Default for JobState {
    fn default() -> Self {
        JobState::idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn success_promotes_to_finished_only_at_full_progress() {
        let mut state = JobState::success();
        state.progress = 99;
        assert_eq!(state.report().kind, JobKind::Success);

        state.progress = 100;
        assert_eq!(state.report().kind, JobKind::Finished);
        // report() is pure
        assert_eq!(state.kind, JobKind::Success);
    }

    #[test]
    fn other_kinds_report_verbatim() {
        let mut state = JobState::failed("boom");
        state.progress = 100;
        assert_eq!(state.report().kind, JobKind::Failed);

        let mut state = JobState::stopped("cancelled");
        state.progress = 100;
        assert_eq!(state.report().kind, JobKind::Stop);
        assert_eq!(state.report().message, "cancelled");
    }
}

//! What an orchestration run reports when it reaches `Done`.

use huddle_models::{MeetingId, RunId};
use huddle_runtime::{DrainOutcome, SessionOutcome};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every session reached a terminal state, successful or not.
    Completed,
    /// The run was refused before any session was built.
    Rejected { missing: Vec<String> },
}

/// Summary of one orchestration run.
#[derive(Debug)]
pub struct OrchestrationReport {
    pub meeting_id: MeetingId,
    pub run_id: RunId,
    pub outcome: RunOutcome,
    /// One entry per session, specialists first.
    pub sessions: Vec<SessionOutcome>,
    /// `None` for rejected runs.
    pub drain: Option<DrainOutcome>,
}

impl OrchestrationReport {
    pub(crate) fn rejected(meeting_id: MeetingId, run_id: RunId, missing: Vec<String>) -> Self {
        Self {
            meeting_id,
            run_id,
            outcome: RunOutcome::Rejected { missing },
            sessions: Vec::new(),
            drain: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    /// Sessions that ended with an error.
    pub fn failures(&self) -> impl Iterator<Item = &SessionOutcome> {
        self.sessions.iter().filter(|s| s.error.is_some())
    }
}

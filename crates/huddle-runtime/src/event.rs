//! Session and run events.

use chrono::{DateTime, Utc};
use huddle_models::{AgentId, MeetingId, RunId, RunPhase, SessionRole, SessionState};

/// How a run's drain step found the session table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The run's entry was popped and its agents detached.
    Removed { sessions: usize },
    /// Someone else (a leave request or a newer run) removed it first.
    AlreadyRemoved,
}

/// Events emitted by sessions and orchestration runs.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A run moved to a new phase.
    PhaseChanged {
        meeting_id: MeetingId,
        run_id: RunId,
        phase: RunPhase,
        at: DateTime<Utc>,
    },
    /// A session changed state.
    StateChanged {
        meeting_id: MeetingId,
        run_id: RunId,
        role: SessionRole,
        agent_id: AgentId,
        state: SessionState,
    },
    /// A run finished its drain step.
    Drained {
        meeting_id: MeetingId,
        run_id: RunId,
        outcome: DrainOutcome,
    },
    /// A run was refused before any session was built.
    Rejected {
        meeting_id: MeetingId,
        run_id: RunId,
        reason: String,
    },
}

impl SessionEvent {
    /// Creates a phase change stamped now.
    pub fn phase(meeting_id: &MeetingId, run_id: &RunId, phase: RunPhase) -> Self {
        Self::PhaseChanged {
            meeting_id: meeting_id.clone(),
            run_id: run_id.clone(),
            phase,
            at: Utc::now(),
        }
    }

    /// Returns the meeting this event belongs to.
    pub fn meeting_id(&self) -> &MeetingId {
        match self {
            Self::PhaseChanged { meeting_id, .. }
            | Self::StateChanged { meeting_id, .. }
            | Self::Drained { meeting_id, .. }
            | Self::Rejected { meeting_id, .. } => meeting_id,
        }
    }

    /// Returns the run this event belongs to.
    pub fn run_id(&self) -> &RunId {
        match self {
            Self::PhaseChanged { run_id, .. }
            | Self::StateChanged { run_id, .. }
            | Self::Drained { run_id, .. }
            | Self::Rejected { run_id, .. } => run_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let meeting: MeetingId = "meet-123".into();
        let run = RunId::new();

        let event = SessionEvent::phase(&meeting, &run, RunPhase::Settling);
        assert_eq!(event.meeting_id(), &meeting);
        assert_eq!(event.run_id(), &run);

        let event = SessionEvent::Drained {
            meeting_id: meeting.clone(),
            run_id: run.clone(),
            outcome: DrainOutcome::AlreadyRemoved,
        };
        assert_eq!(event.meeting_id(), &meeting);
    }
}

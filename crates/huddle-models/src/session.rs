//! Session and orchestration-run states.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::AgentId;

/// Lifecycle state of one agent session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Built but not started.
    Created,
    /// Joining the room and registering.
    Starting,
    /// `on_enter` completed; processing input.
    Running,
    /// Processing loop returned normally.
    Ended,
    /// Startup or processing raised.
    Failed,
}

impl SessionState {
    /// Returns true for `Ended` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Ended => "ended",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Role of a session within its meeting's cohort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionRole {
    /// The user-facing agent.
    Primary,
    /// A background agent, keyed by its identity so several may serve one domain.
    Specialist(AgentId),
}

impl SessionRole {
    /// Returns true for the primary role.
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Primary)
    }
}

impl fmt::Display for SessionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Specialist(agent_id) => write!(f, "specialist:{}", agent_id),
        }
    }
}

/// Phase of one orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Building,
    SpecialistsStarting,
    Settling,
    PrimaryStarting,
    Running,
    Draining,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Building => "building",
            Self::SpecialistsStarting => "specialists_starting",
            Self::Settling => "settling",
            Self::PrimaryStarting => "primary_starting",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

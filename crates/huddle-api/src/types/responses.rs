//! Response DTOs for the API.

use serde::Serialize;

use huddle_runtime::SessionSnapshot;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub message: String,
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Join acknowledgement; orchestration continues in the background.
#[derive(Debug, Clone, Serialize)]
pub struct JoinAgentResponse {
    pub message: String,
    pub meeting_id: String,
    /// Always `initiated`.
    pub status: String,
}

/// Leave result.
#[derive(Debug, Clone, Serialize)]
pub struct LeaveAgentResponse {
    /// `removed` or `not_found`.
    pub status: String,
    pub meeting_id: String,
    pub message: String,
}

/// Active meetings.
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub active_sessions: Vec<String>,
    pub count: usize,
}

/// One session of a meeting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub role: String,
    pub agent_id: String,
    pub state: String,
    pub user_facing: bool,
    pub registered: bool,
}

impl From<&SessionSnapshot> for SessionSummary {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            role: snapshot.role.to_string(),
            agent_id: snapshot.agent_id.to_string(),
            state: snapshot.state.to_string(),
            user_facing: snapshot.user_facing,
            registered: snapshot.registered,
        }
    }
}

/// Sessions of one meeting.
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetailResponse {
    pub meeting_id: String,
    /// Always `active`; unknown meetings are a 404.
    pub status: String,
    pub run_id: String,
    pub scenario: String,
    pub sessions: Vec<SessionSummary>,
}

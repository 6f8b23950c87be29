//! Join and leave handlers.

use axum::{extract::State, Json};
use tracing::info;

use huddle_models::MeetingId;
use huddle_orchestrator::LeaveOutcome;

use crate::error::Result;
use crate::state::AppState;
use crate::types::{JoinAgentRequest, JoinAgentResponse, LeaveAgentRequest, LeaveAgentResponse};

/// POST /join-agent - Starts an orchestration run for a meeting.
///
/// Returns as soon as the run is spawned; startup failures are logged by
/// the run itself.
pub async fn join_agent(
    State(state): State<AppState>,
    Json(req): Json<JoinAgentRequest>,
) -> Result<Json<JoinAgentResponse>> {
    let meeting = req.into_meeting_config()?;
    let meeting_id = meeting.meeting_id.to_string();

    info!(
        meeting_id = %meeting_id,
        scenario = state.orchestrator.scenario_name(),
        model = %meeting.model.model,
        voice = %meeting.voice.voice,
        "join requested"
    );
    // Detached: the run drains itself when the primary ends.
    drop(state.orchestrator.spawn(meeting));

    Ok(Json(JoinAgentResponse {
        message: format!("AI agent joining process initiated for meeting {}", meeting_id),
        meeting_id,
        status: "initiated".to_string(),
    }))
}

/// POST /leave-agent - Stops every session of a meeting.
pub async fn leave_agent(
    State(state): State<AppState>,
    Json(req): Json<LeaveAgentRequest>,
) -> Json<LeaveAgentResponse> {
    let meeting_id = MeetingId::from(req.meeting_id.as_str());

    let response = match state.orchestrator.leave(&meeting_id) {
        LeaveOutcome::Removed { run_id, sessions } => {
            info!(meeting_id = %meeting_id, run_id = %run_id, sessions, "leave completed");
            LeaveAgentResponse {
                status: "removed".to_string(),
                meeting_id: req.meeting_id.clone(),
                message: format!("Session for meeting {} has been removed.", req.meeting_id),
            }
        }
        LeaveOutcome::NotFound => LeaveAgentResponse {
            status: "not_found".to_string(),
            meeting_id: req.meeting_id.clone(),
            message: format!("No session found for meeting {}.", req.meeting_id),
        },
    };
    Json(response)
}

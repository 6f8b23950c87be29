//! Session inspection handlers.

use axum::{
    extract::{Path, State},
    Json,
};

use huddle_models::MeetingId;

use crate::error::{ApiError, Result};
use crate::state::AppState;
use crate::types::{SessionDetailResponse, SessionListResponse, SessionSummary};

/// GET /sessions - Lists meetings with live sessions.
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    let active_sessions: Vec<String> = state
        .orchestrator
        .table()
        .meeting_ids()
        .into_iter()
        .map(|id| id.to_string())
        .collect();
    let count = active_sessions.len();

    Json(SessionListResponse {
        active_sessions,
        count,
    })
}

/// GET /sessions/:meeting_id - Sessions of one meeting.
pub async fn get_session(
    State(state): State<AppState>,
    Path(meeting_id): Path<String>,
) -> Result<Json<SessionDetailResponse>> {
    let id = MeetingId::from(meeting_id.as_str());
    let table = state.orchestrator.table();

    let run_id = table
        .run_id(&id)
        .ok_or_else(|| ApiError::NotFound(format!("no session for meeting {}", meeting_id)))?;
    let sessions = table.snapshots(&id).iter().map(SessionSummary::from).collect();

    Ok(Json(SessionDetailResponse {
        meeting_id,
        status: "active".to_string(),
        run_id: run_id.to_string(),
        scenario: state.orchestrator.scenario_name().to_string(),
        sessions,
    }))
}

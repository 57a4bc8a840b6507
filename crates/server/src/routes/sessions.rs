use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use newsroom::{
    GateDecision, NavigationResult, NewsroomError, Session, SessionId, SessionSummary,
    VerifyResult, WorkflowStage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct SessionList {
    pub active_sessions: Vec<SessionSummary>,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub session_id: SessionId,
    pub officer_id: String,
    /// Fact sheet field corrections applied before the sheet is marked verified.
    #[serde(default)]
    pub corrections: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub session_id: SessionId,
    #[serde(default)]
    pub from: Option<WorkflowStage>,
    pub to: WorkflowStage,
}

pub async fn list_sessions(State(state): State<AppState>) -> ResponseJson<ApiResponse<SessionList>> {
    let active_sessions = state.orchestrator().list_sessions().await;
    ResponseJson(ApiResponse::success(SessionList {
        count: active_sessions.len(),
        active_sessions,
    }))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<ResponseJson<ApiResponse<Session>>, ApiError> {
    let session = state.orchestrator().get_session(session_id).await?;
    Ok(ResponseJson(ApiResponse::success(session)))
}

pub async fn verify(
    State(state): State<AppState>,
    Json(payload): Json<VerifyRequest>,
) -> Result<ResponseJson<ApiResponse<VerifyResult>>, ApiError> {
    let result = state
        .orchestrator()
        .verify(payload.session_id, &payload.officer_id, payload.corrections)
        .await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// Moves the wizard. A denied move is reported as a conflict naming the unmet condition.
pub async fn navigate(
    State(state): State<AppState>,
    Json(payload): Json<NavigateRequest>,
) -> Result<ResponseJson<ApiResponse<NavigationResult>>, ApiError> {
    let result = state
        .orchestrator()
        .navigate(payload.session_id, payload.from, payload.to)
        .await?;

    if let GateDecision::Deny { reason } = &result.decision {
        return Err(NewsroomError::StageGateDenied {
            reason: reason.clone(),
        }
        .into());
    }
    Ok(ResponseJson(ApiResponse::success(result)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sessions", get(list_sessions))
        .route("/sessions/{session_id}", get(get_session))
        .route("/verify", post(verify))
        .route("/navigate", post(navigate))
}

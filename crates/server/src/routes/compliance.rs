use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::post};
use newsroom::{SessionId, models::ComplianceReport};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ComplianceRequest {
    pub session_id: SessionId,
}

/// Re-runs the sensitivity review against the session's current video package.
pub async fn review_compliance(
    State(state): State<AppState>,
    Json(payload): Json<ComplianceRequest>,
) -> Result<ResponseJson<ApiResponse<ComplianceReport>>, ApiError> {
    let report = state
        .orchestrator()
        .review_compliance(payload.session_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/compliance", post(review_compliance))
}

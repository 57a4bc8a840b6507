use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::post};
use newsroom::{GenerationResult, SessionId, models::GenerationRequest};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub request: GenerationRequest,
}

pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateRequest>,
) -> Result<ResponseJson<ApiResponse<GenerationResult>>, ApiError> {
    let result = state
        .orchestrator()
        .generate(payload.session_id, payload.request)
        .await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

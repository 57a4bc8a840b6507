use axum::{Json, Router, extract::State, response::Json as ResponseJson, routing::post};
use newsroom::{SessionId, models::PreviewState};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct PreviewFramesRequest {
    pub session_id: SessionId,
    /// Defaults to the primary language of the generation config.
    #[serde(default)]
    pub language_code: Option<String>,
}

pub async fn generate_preview_frames(
    State(state): State<AppState>,
    Json(payload): Json<PreviewFramesRequest>,
) -> Result<ResponseJson<ApiResponse<PreviewState>>, ApiError> {
    let preview = state
        .orchestrator()
        .generate_previews(payload.session_id, payload.language_code)
        .await?;
    Ok(ResponseJson(ApiResponse::success(preview)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/preview-frames", post(generate_preview_frames))
}

use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use newsroom::{
    SessionId,
    models::{SocialPackage, SocialPlatform},
};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SocialGenerateRequest {
    pub session_id: SessionId,
    #[serde(default)]
    pub platform: Option<String>,
}

pub async fn generate_social(
    State(state): State<AppState>,
    Json(payload): Json<SocialGenerateRequest>,
) -> Result<ResponseJson<ApiResponse<SocialPackage>>, ApiError> {
    let platform = match payload.platform.as_deref() {
        Some(name) => name.parse::<SocialPlatform>().map_err(ApiError::BadRequest)?,
        None => SocialPlatform::default(),
    };
    let social = state
        .orchestrator()
        .generate_social(payload.session_id, platform)
        .await?;
    Ok(ResponseJson(ApiResponse::success(social)))
}

pub async fn get_social(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<ResponseJson<ApiResponse<SocialPackage>>, ApiError> {
    let session = state.orchestrator().get_session(session_id).await?;
    let social = session.social.ok_or_else(|| {
        ApiError::NotFound(format!("no social package generated for session {}", session_id))
    })?;
    Ok(ResponseJson(ApiResponse::success(social)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/social/generate", post(generate_social))
        .route("/social/{session_id}", get(get_social))
}

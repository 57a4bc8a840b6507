use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use newsroom::{
    NewsroomError, RenderStatusView, RenderTicket, SessionId,
    models::{RenderOutcome, RenderStatus},
};
use serde::{Deserialize, Serialize};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct RenderRequestBody {
    pub session_id: SessionId,
    pub language_code: String,
}

/// Callback body from the renderer, e.g.
/// `{"project_id": "...", "outcome": "completed", "output": {"kind": "url", "url": "..."}}`.
#[derive(Debug, Deserialize)]
pub struct RenderCompletion {
    pub project_id: String,
    #[serde(flatten)]
    pub outcome: RenderOutcome,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub accepted: bool,
    pub project_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RenderStatus>,
    pub duplicate: bool,
}

pub async fn request_render(
    State(state): State<AppState>,
    Json(payload): Json<RenderRequestBody>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<RenderTicket>>), ApiError> {
    let ticket = state
        .orchestrator()
        .request_render(payload.session_id, &payload.language_code)
        .await?;
    Ok((StatusCode::ACCEPTED, ResponseJson(ApiResponse::success(ticket))))
}

/// Renderer callback. Unknown projects are acknowledged with `accepted: false`
/// since the renderer has nothing to retry.
pub async fn render_complete(
    State(state): State<AppState>,
    Json(payload): Json<RenderCompletion>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<CompletionResponse>>), ApiError> {
    match state
        .orchestrator()
        .render_complete(&payload.project_id, payload.outcome)
        .await
    {
        Ok(ack) => Ok((
            StatusCode::OK,
            ResponseJson(ApiResponse::success(CompletionResponse {
                accepted: true,
                project_id: ack.project_id,
                status: Some(ack.status),
                duplicate: ack.duplicate,
            })),
        )),
        Err(NewsroomError::UnknownProject(project_id)) => Ok((
            StatusCode::ACCEPTED,
            ResponseJson(ApiResponse::success(CompletionResponse {
                accepted: false,
                project_id,
                status: None,
                duplicate: false,
            })),
        )),
        Err(e) => Err(e.into()),
    }
}

pub async fn render_status(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<ResponseJson<ApiResponse<RenderStatusView>>, ApiError> {
    let view = state.orchestrator().render_status(&project_id).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/render", post(request_render))
        .route("/render/complete", post(render_complete))
        .route("/render/{project_id}", get(render_status))
}

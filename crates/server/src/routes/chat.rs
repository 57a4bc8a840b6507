use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use newsroom::{
    ChatInput, ChatMessage, ChatOptions, ChatReply, ChatTarget, SessionId, models::SocialSection,
};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ChatRequestBody {
    pub session_id: SessionId,
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Video-package edits only.
    #[serde(default)]
    pub language_code: Option<String>,
    /// Social edits only.
    #[serde(default)]
    pub section: SocialSection,
}

/// One chat turn against `factsheet`, `video-package`, `characters`,
/// `preview-frames` or `social`. A rejected update still answers 200 with
/// `updated: false`.
pub async fn chat(
    State(state): State<AppState>,
    Path(target): Path<ChatTarget>,
    Json(body): Json<ChatRequestBody>,
) -> Result<ResponseJson<ApiResponse<ChatReply>>, ApiError> {
    let input = ChatInput {
        message: body.message,
        history: body.history,
    };
    let options = ChatOptions {
        language_code: body.language_code,
        section: body.section,
    };
    let reply = state
        .orchestrator()
        .chat(body.session_id, target, input, options)
        .await?;
    Ok(ResponseJson(ApiResponse::success(reply)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/chat/{target}", post(chat))
}

//! Lookups the creator studio uses to build its forms, plus per-session
//! avatar suggestions.

use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use newsroom::{
    AvatarPreferences, AvatarRecommendation, SessionId,
    models::{
        Avatar, Language, MAX_SCENE_DURATION_SECS, MIN_VIDEO_DURATION_SECS, TargetAudience, Tone,
        VideoFormat, trusted_avatars,
    },
};
use serde::{Deserialize, Serialize};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct AvatarList {
    pub avatars: Vec<Avatar>,
}

#[derive(Debug, Serialize)]
pub struct FormatConstraint {
    pub format: VideoFormat,
    pub max_duration_seconds: u32,
    pub default_duration_seconds: u32,
}

#[derive(Debug, Serialize)]
pub struct LanguageOption {
    pub code: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StudioConfig {
    pub formats: Vec<FormatConstraint>,
    pub max_scene_duration: u32,
    pub min_video_duration: u32,
    pub supported_languages: Vec<LanguageOption>,
    pub supported_tones: Vec<&'static str>,
    pub supported_audiences: Vec<&'static str>,
}

pub async fn list_avatars() -> ResponseJson<ApiResponse<AvatarList>> {
    ResponseJson(ApiResponse::success(AvatarList {
        avatars: trusted_avatars(),
    }))
}

pub async fn get_config() -> ResponseJson<ApiResponse<StudioConfig>> {
    let formats = VideoFormat::ALL
        .into_iter()
        .map(|format| FormatConstraint {
            format,
            max_duration_seconds: format.max_duration_secs(),
            default_duration_seconds: format.default_duration_secs(),
        })
        .collect();

    ResponseJson(ApiResponse::success(StudioConfig {
        formats,
        max_scene_duration: MAX_SCENE_DURATION_SECS,
        min_video_duration: MIN_VIDEO_DURATION_SECS,
        supported_languages: Language::ALL
            .iter()
            .map(|lang| LanguageOption {
                code: lang.code(),
                label: lang.label(),
            })
            .collect(),
        supported_tones: Tone::ALL.iter().map(Tone::label).collect(),
        supported_audiences: TargetAudience::ALL.iter().map(TargetAudience::label).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecommendAvatarsRequest {
    pub session_id: SessionId,
    #[serde(flatten)]
    pub preferences: AvatarPreferences,
}

pub async fn recommend_avatars(
    State(state): State<AppState>,
    Json(payload): Json<RecommendAvatarsRequest>,
) -> Result<ResponseJson<ApiResponse<AvatarRecommendation>>, ApiError> {
    let recommendation = state
        .orchestrator()
        .recommend_avatars(payload.session_id, payload.preferences)
        .await?;
    Ok(ResponseJson(ApiResponse::success(recommendation)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/avatars", get(list_avatars))
        .route("/recommend-avatars", post(recommend_avatars))
        .route("/config", get(get_config))
}

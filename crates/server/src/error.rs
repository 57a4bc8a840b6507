use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use newsroom::NewsroomError;
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Newsroom(#[from] NewsroomError),
    #[error("Bad Request: {0}")]
    BadRequest(String),
    #[error("Not Found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = match &self {
            ApiError::Newsroom(err) => match err {
                NewsroomError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SessionNotFound"),
                NewsroomError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "ValidationFailed"),
                NewsroomError::StageGateDenied { .. } => (StatusCode::CONFLICT, "StageGateDenied"),
                NewsroomError::GenerationInProgress(_) => {
                    (StatusCode::CONFLICT, "GenerationInProgress")
                }
                NewsroomError::RenderAlreadyFinalized(_) => {
                    (StatusCode::CONFLICT, "RenderAlreadyFinalized")
                }
                NewsroomError::ExtractionFailed(_) => (StatusCode::BAD_GATEWAY, "ExtractionFailed"),
                NewsroomError::GenerationFailed(_) => (StatusCode::BAD_GATEWAY, "GenerationFailed"),
                NewsroomError::UnknownProject(_) => (StatusCode::NOT_FOUND, "UnknownProject"),
            },
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
        };

        let error_message = match &self {
            ApiError::Newsroom(NewsroomError::StageGateDenied { reason }) => reason.clone(),
            ApiError::Newsroom(err) => err.to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
        };

        if status_code.is_server_error() {
            tracing::error!("{}: {}", error_type, error_message);
        } else {
            tracing::debug!("{}: {}", error_type, error_message);
        }

        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}

use std::{convert::Infallible, time::Duration};

use axum::{
    Json, Router,
    extract::State,
    response::{
        Json as ResponseJson,
        sse::{Event, KeepAlive, Sse},
    },
    routing::post,
};
use futures::{Stream, StreamExt};
use newsroom::{IntakeEvent, IntakeResult, models::IntakeInput};
use tokio_stream::wrappers::ReceiverStream;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

pub async fn intake(
    State(state): State<AppState>,
    Json(input): Json<IntakeInput>,
) -> Result<ResponseJson<ApiResponse<IntakeResult>>, ApiError> {
    let result = state.orchestrator().intake(input).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// Streams extraction progress as SSE: `thought` events, then one `result` or `error`.
pub async fn intake_stream(
    State(state): State<AppState>,
    Json(input): Json<IntakeInput>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = state.orchestrator().intake_stream(input);

    let stream = ReceiverStream::new(events).map(|event| {
        let name = match &event {
            IntakeEvent::Thought { .. } => "thought",
            IntakeEvent::Result { .. } => "result",
            IntakeEvent::Error { .. } => "error",
        };
        let data = serde_json::to_string(&event).unwrap_or_else(|e| {
            tracing::error!("Failed to encode intake event: {}", e);
            r#"{"type":"error","message":"event encoding failed"}"#.to_string()
        });
        Ok::<_, Infallible>(Event::default().event(name).data(data))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/intake", post(intake))
        .route("/intake/stream", post(intake_stream))
}

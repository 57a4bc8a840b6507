use axum::{extract::State, response::Json as ResponseJson};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utils::response::ApiResponse;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub gateway_configured: bool,
    pub deep_research_enabled: bool,
    pub sensitivity_check_enabled: bool,
    pub active_sessions: usize,
    pub timestamp: DateTime<Utc>,
}

pub async fn health_check(State(state): State<AppState>) -> ResponseJson<ApiResponse<HealthStatus>> {
    let orchestrator = state.orchestrator();
    let config = orchestrator.config();
    ResponseJson(ApiResponse::success(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        gateway_configured: config.gateway_api_key.is_some(),
        deep_research_enabled: config.use_deep_research,
        sensitivity_check_enabled: !config.skip_sensitivity_check,
        active_sessions: orchestrator.list_sessions().await.len(),
        timestamp: Utc::now(),
    }))
}

use std::sync::Arc;

use newsroom::PipelineOrchestrator;

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

/// Shared handler state. Cloned per request, so everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<PipelineOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: PipelineOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn orchestrator(&self) -> &Arc<PipelineOrchestrator> {
        &self.orchestrator
    }
}

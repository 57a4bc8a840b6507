use std::sync::Arc;

use anyhow::Error as AnyhowError;
use axum::http::{HeaderValue, Method, header};
use newsroom::{
    CollaboratorError, Collaborators, HttpCollaborators, InMemorySessionRegistry, NewsroomConfig,
    PipelineOrchestrator,
};
use server::{AppState, config::ServerConfig, middleware::REQUEST_ID_HEADER, routes};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),
    #[error(transparent)]
    Other(#[from] AnyhowError),
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // Load environment variables from `.env` if present so local development picks up gateway keys
    dotenv::dotenv().ok();

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter_string = format!(
        "warn,server={level},newsroom={level},utils={level},tower_http={level}",
        level = log_level
    );
    let env_filter = EnvFilter::try_new(filter_string)
        .map_err(|e| anyhow::anyhow!("invalid tracing filter: {}", e))?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let server_config = ServerConfig::default();
    let newsroom_config = NewsroomConfig::default();

    tracing::info!(
        "Generation gateway at {} (deep research: {}, sensitivity check: {})",
        newsroom_config.gateway_url,
        newsroom_config.use_deep_research,
        !newsroom_config.skip_sensitivity_check
    );
    if newsroom_config.gateway_api_key.is_none() {
        tracing::warn!("GENERATION_API_KEY not set - gateway calls go out unauthenticated");
    }
    if newsroom_config.render_callback_url.is_none() {
        tracing::warn!("RENDER_CALLBACK_URL not set - renderer must already know where to report");
    }

    let gateway = HttpCollaborators::new(&newsroom_config)?;
    let orchestrator = PipelineOrchestrator::new(
        newsroom_config,
        Collaborators::from_gateway(gateway),
        Arc::new(InMemorySessionRegistry::new()),
    );

    let app_router = routes::router(AppState::new(orchestrator)).layer(cors_layer(&server_config));

    let listener = tokio::net::TcpListener::bind(server_config.bind_address()).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Server running on http://{}", local_addr);

    axum::serve(listener, app_router).await?;
    Ok(())
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([header::HeaderName::from_static(REQUEST_ID_HEADER)])
}

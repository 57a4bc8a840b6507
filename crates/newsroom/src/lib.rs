//! # Newsroom
//!
//! Session orchestration for the scam awareness video pipeline: intake of a
//! scam report, officer verification, multi-language script generation,
//! character and preview refinement over chat, render tracking, compliance
//! review and social packaging.
//!
//! All state is in memory and lost on restart.

pub mod chat;
pub mod collaborators;
pub mod config;
pub mod models;
pub mod orchestrator;
pub mod registry;
pub mod render;
pub mod session;
pub mod stage_gate;

#[cfg(test)]
mod orchestrator_tests;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use chat::{ChatInput, ChatMessage, ChatReply, ChatRole, ChatTarget};
pub use collaborators::{http::HttpCollaborators, CollaboratorError, Collaborators};
pub use config::NewsroomConfig;
pub use orchestrator::{
    AvatarPreferences, AvatarRecommendation, ChatOptions, GenerationResult, IntakeEvent, IntakeResult, NavigationResult,
    PipelineOrchestrator, VerifyResult,
};
pub use registry::{InMemorySessionRegistry, SessionRegistry};
pub use render::{CompletionAck, RenderStatusView, RenderTicket};
pub use session::{Session, SessionId, SessionSummary, WorkflowStage};
pub use stage_gate::{can_advance, GateDecision};

#[derive(Debug, thiserror::Error)]
pub enum NewsroomError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("fact extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("generation failed: {0}")]
    GenerationFailed(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    #[error("stage gate denied: {reason}")]
    StageGateDenied { reason: String },
    #[error("unknown render project: {0}")]
    UnknownProject(String),
    #[error("render already in progress for {0}")]
    GenerationInProgress(String),
    #[error("render result already recorded for {0}")]
    RenderAlreadyFinalized(String),
}

pub type Result<T> = std::result::Result<T, NewsroomError>;

//! Contracts for the external generation services the pipeline drives.
//!
//! The orchestrator only ever talks to these traits. [`http::HttpCollaborators`]
//! implements all of them against the generation gateway.

pub mod http;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    chat::{ChatMessage, ChatTarget},
    models::{
        Avatar, Character, ComplianceReport, FactSheet, FrameRole, GenerationConfig, ImageRef,
        Language, Scene, ScriptDraft, SocialPackage, SocialPlatform, SourceType, TargetAudience,
        Tone, VideoPackage,
    },
};

#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unparseable output: {0}")]
    Malformed(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub source_type: SourceType,
    pub content: String,
    pub additional_context: Option<String>,
    pub deep_research: bool,
}

#[async_trait]
pub trait FactExtractor: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<FactSheet, CollaboratorError>;

    /// Same result as [`FactExtractor::extract`], reporting progress notes on
    /// `thoughts` as it goes. Send failures are ignored.
    async fn extract_streaming(
        &self,
        request: &ExtractionRequest,
        thoughts: mpsc::Sender<String>,
    ) -> Result<FactSheet, CollaboratorError> {
        let _ = thoughts
            .send(format!("Reading {:?} source", request.source_type))
            .await;
        self.extract(request).await
    }
}

#[async_trait]
pub trait ScriptWriter: Send + Sync {
    async fn write_script(
        &self,
        fact_sheet: &FactSheet,
        config: &GenerationConfig,
        target_duration_secs: u32,
    ) -> Result<ScriptDraft, CollaboratorError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Localises the draft scenes. Must return the same scene ids in the same order.
    async fn translate(
        &self,
        draft: &ScriptDraft,
        language: Language,
    ) -> Result<Vec<Scene>, CollaboratorError>;
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn character_image(&self, character: &Character) -> Result<ImageRef, CollaboratorError>;

    async fn scene_frame(
        &self,
        scene_id: u32,
        frame: FrameRole,
        prompt: &str,
    ) -> Result<ImageRef, CollaboratorError>;
}

#[async_trait]
pub trait ComplianceReviewer: Send + Sync {
    async fn review(
        &self,
        package: &VideoPackage,
        standards: &[String],
    ) -> Result<ComplianceReport, CollaboratorError>;
}

#[async_trait]
pub trait SocialCopywriter: Send + Sync {
    async fn write_social(
        &self,
        fact_sheet: &FactSheet,
        package: &VideoPackage,
        platform: SocialPlatform,
    ) -> Result<SocialPackage, CollaboratorError>;
}

/// What the avatar advisor sees: the case plus whatever the studio has chosen so far.
#[derive(Debug, Clone, Serialize)]
pub struct AvatarBrief {
    pub fact_sheet: FactSheet,
    pub target_audience: Option<TargetAudience>,
    pub language: Option<Language>,
    pub tone: Option<Tone>,
    pub candidates: Vec<Avatar>,
}

#[async_trait]
pub trait AvatarAdvisor: Send + Sync {
    /// Returns candidate ids, best first. Ids outside `candidates` are discarded by the caller.
    async fn recommend(&self, brief: &AvatarBrief) -> Result<Vec<String>, CollaboratorError>;
}

/// One chat turn as sent to the chat model.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub target: ChatTarget,
    pub document: Value,
    /// JSON Schema the `updates` block must satisfy.
    pub update_schema: Value,
    pub message: String,
    pub history: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the raw reply text, possibly ending in a fenced update block.
    async fn complete(&self, request: &ChatRequest) -> Result<String, CollaboratorError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenePrompt {
    pub scene_id: u32,
    pub duration_secs: u32,
    pub visual_prompt: String,
    pub audio_script: String,
    pub text_overlay: Option<String>,
}

impl From<&Scene> for ScenePrompt {
    fn from(scene: &Scene) -> Self {
        Self {
            scene_id: scene.scene_id,
            duration_secs: scene.duration_est_seconds,
            visual_prompt: scene.visual_prompt.clone(),
            audio_script: scene.audio_script.clone(),
            text_overlay: scene.text_overlay.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderRequest {
    pub project_id: String,
    pub job_id: String,
    pub language_code: String,
    pub avatar_id: Option<String>,
    pub scenes: Vec<ScenePrompt>,
    pub callback_url: Option<String>,
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Hands the job over. Completion arrives later through the render callback.
    async fn dispatch(&self, request: &RenderRequest) -> Result<(), CollaboratorError>;
}

/// Every service the pipeline needs, behind trait objects.
#[derive(Clone)]
pub struct Collaborators {
    pub extractor: Arc<dyn FactExtractor>,
    pub script_writer: Arc<dyn ScriptWriter>,
    pub translator: Arc<dyn Translator>,
    pub images: Arc<dyn ImageGenerator>,
    pub compliance: Arc<dyn ComplianceReviewer>,
    pub social: Arc<dyn SocialCopywriter>,
    pub chat: Arc<dyn ChatModel>,
    pub avatars: Arc<dyn AvatarAdvisor>,
    pub renderer: Arc<dyn Renderer>,
}

impl Collaborators {
    /// Backs every contract with one shared gateway client.
    pub fn from_gateway(gateway: http::HttpCollaborators) -> Self {
        let gateway = Arc::new(gateway);
        Self {
            extractor: gateway.clone(),
            script_writer: gateway.clone(),
            translator: gateway.clone(),
            images: gateway.clone(),
            compliance: gateway.clone(),
            social: gateway.clone(),
            chat: gateway.clone(),
            avatars: gateway.clone(),
            renderer: gateway,
        }
    }
}

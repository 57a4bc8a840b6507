use std::{collections::BTreeMap, future::Future, sync::Arc};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::{
    chat::{
        patch::{
            parse_patch, CharactersPatch, DocumentPatch, FactSheetPatch, PreviewPatch, SocialPatch,
            VideoPackagePatch,
        },
        ChatInput, ChatPatchEngine, ChatReply, ChatTarget, PatchProposal, Proposal,
    },
    collaborators::{AvatarBrief, CollaboratorError, Collaborators, ExtractionRequest},
    config::NewsroomConfig,
    models::{
        keep_trusted_avatars, trusted_avatars,
        video::{validate_scenes, validate_translation},
        CharacterRoster, ComplianceReport, FactSheet, FrameKey, FrameRole, GenerationConfig,
        GenerationRequest, IntakeInput, Language, PreviewFrame, PreviewState, RefinementEntry,
        RenderOutcome, SceneBreakdown, SocialPackage, SocialPlatform, SocialSection,
        TargetAudience, Tone, VideoPackage, DEFAULT_AVATAR_IDS,
    },
    registry::{self, SessionHandle, SessionRegistry, SessionWriter},
    render::{CompletionAck, RenderJobTracker, RenderStatusView, RenderTicket},
    session::{Session, SessionId, SessionSummary, WorkflowStage},
    stage_gate::{can_advance, GateDecision},
    NewsroomError, Result,
};

pub const MIN_INTAKE_CHARS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeResult {
    pub session_id: SessionId,
    pub fact_sheet: FactSheet,
}

/// Events emitted by streaming intake: any number of thoughts, then exactly
/// one result or error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntakeEvent {
    Thought {
        message: String,
    },
    Result {
        session_id: SessionId,
        fact_sheet: FactSheet,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub fact_sheet: FactSheet,
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationResult {
    pub stage: WorkflowStage,
    pub decision: GateDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub video_package: VideoPackage,
    pub compliance_report: Option<ComplianceReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_roster: Option<CharacterRoster>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Optional studio choices that sharpen an avatar recommendation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvatarPreferences {
    #[serde(default)]
    pub target_audience: Option<TargetAudience>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub tone: Option<Tone>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarRecommendation {
    pub recommended_avatars: Vec<String>,
    /// True when the advisor gave nothing usable and defaults were returned.
    pub fallback: bool,
}

/// Per-target chat options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Language variant a video-package edit addresses. Defaults to the primary language.
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub section: SocialSection,
}

/// Entry point for every externally triggered operation.
pub struct PipelineOrchestrator {
    config: NewsroomConfig,
    registry: Arc<dyn SessionRegistry>,
    collaborators: Collaborators,
    chat: ChatPatchEngine,
    renders: RenderJobTracker,
}

impl PipelineOrchestrator {
    pub fn new(
        config: NewsroomConfig,
        collaborators: Collaborators,
        registry: Arc<dyn SessionRegistry>,
    ) -> Self {
        let chat = ChatPatchEngine::new(collaborators.chat.clone(), config.chat_history_window);
        let renders = RenderJobTracker::new(
            registry.clone(),
            collaborators.renderer.clone(),
            config.render_seconds_per_scene,
            config.render_callback_url.clone(),
        );
        Self {
            config,
            registry,
            collaborators,
            chat,
            renders,
        }
    }

    pub fn config(&self) -> &NewsroomConfig {
        &self.config
    }

    fn handle(&self, id: SessionId) -> Result<Arc<SessionHandle>> {
        self.registry
            .get(&id)
            .ok_or(NewsroomError::SessionNotFound(id))
    }

    async fn with_timeout<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, CollaboratorError>>,
    ) -> std::result::Result<T, CollaboratorError> {
        match tokio::time::timeout(self.config.agent_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Timeout(self.config.agent_timeout_secs)),
        }
    }

    fn extraction_request(&self, input: &IntakeInput) -> Result<ExtractionRequest> {
        let content = input.content.trim();
        if content.chars().count() < MIN_INTAKE_CHARS {
            return Err(NewsroomError::ValidationFailed(format!(
                "content must be at least {} characters",
                MIN_INTAKE_CHARS
            )));
        }
        Ok(ExtractionRequest {
            source_type: input.source_type,
            content: content.to_string(),
            additional_context: input.additional_context.clone(),
            deep_research: input.use_deep_research.unwrap_or(self.config.use_deep_research),
        })
    }

    fn register(&self, mut fact_sheet: FactSheet) -> IntakeResult {
        // Extraction output is never trusted as verified.
        fact_sheet.revoke_verification();
        let session = Session::new(SessionId::new(), fact_sheet.clone());
        let session_id = session.id;
        self.registry.put(session);
        tracing::info!(
            "[PIPELINE] session {} created: {} ({:?})",
            session_id,
            fact_sheet.scam_name,
            fact_sheet.category
        );
        IntakeResult {
            session_id,
            fact_sheet,
        }
    }

    /// Extracts a fact sheet and opens a session for it. Nothing is
    /// registered when extraction fails.
    pub async fn intake(&self, input: IntakeInput) -> Result<IntakeResult> {
        let request = self.extraction_request(&input)?;
        tracing::info!("[PIPELINE] intake from {:?}", request.source_type);
        let fact_sheet = self
            .with_timeout(self.collaborators.extractor.extract(&request))
            .await
            .map_err(|e| {
                tracing::warn!("[PIPELINE] extraction failed: {}", e);
                NewsroomError::ExtractionFailed(e.to_string())
            })?;
        Ok(self.register(fact_sheet))
    }

    /// Streaming variant of [`PipelineOrchestrator::intake`].
    pub fn intake_stream(self: &Arc<Self>, input: IntakeInput) -> mpsc::Receiver<IntakeEvent> {
        let (events, receiver) = mpsc::channel(32);
        let this = self.clone();

        tokio::spawn(async move {
            let request = match this.extraction_request(&input) {
                Ok(request) => request,
                Err(e) => {
                    let _ = events.send(IntakeEvent::Error { message: e.to_string() }).await;
                    return;
                }
            };

            let (thought_tx, mut thought_rx) = mpsc::channel::<String>(32);
            let forward_events = events.clone();
            let forward = tokio::spawn(async move {
                while let Some(message) = thought_rx.recv().await {
                    if forward_events
                        .send(IntakeEvent::Thought { message })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
            });

            let result = this
                .with_timeout(
                    this.collaborators
                        .extractor
                        .extract_streaming(&request, thought_tx),
                )
                .await;
            let _ = forward.await;

            let event = match result {
                Ok(fact_sheet) => {
                    let IntakeResult {
                        session_id,
                        fact_sheet,
                    } = this.register(fact_sheet);
                    IntakeEvent::Result {
                        session_id,
                        fact_sheet,
                    }
                }
                Err(e) => {
                    tracing::warn!("[PIPELINE] streaming extraction failed: {}", e);
                    IntakeEvent::Error {
                        message: NewsroomError::ExtractionFailed(e.to_string()).to_string(),
                    }
                }
            };
            let _ = events.send(event).await;
        });

        receiver
    }

    /// Applies optional corrections, then marks the fact sheet verified.
    pub async fn verify(
        &self,
        id: SessionId,
        officer_id: &str,
        corrections: Option<Value>,
    ) -> Result<VerifyResult> {
        let handle = self.handle(id)?;
        let officer_id = officer_id.trim();
        if officer_id.is_empty() {
            return Err(NewsroomError::ValidationFailed(
                "officer_id is required".to_string(),
            ));
        }

        let writer = handle.writer().await;
        let mut fact_sheet = writer.read(|s| s.fact_sheet.clone()).await;
        if let Some(corrections) = corrections.filter(|c| !c.is_null()) {
            let patch: FactSheetPatch =
                parse_patch(corrections).map_err(NewsroomError::ValidationFailed)?;
            patch
                .apply(&mut fact_sheet)
                .map_err(NewsroomError::ValidationFailed)?;
        }
        fact_sheet.verify(officer_id);
        writer
            .commit(|s| s.fact_sheet = fact_sheet.clone())
            .await;

        tracing::info!("[PIPELINE] session {} verified by {}", id, officer_id);
        Ok(VerifyResult {
            verified: fact_sheet.is_verified(),
            fact_sheet,
        })
    }

    /// Moves the session to `to` when the stage gate allows it. `from`
    /// defaults to the session's current stage.
    pub async fn navigate(
        &self,
        id: SessionId,
        from: Option<WorkflowStage>,
        to: WorkflowStage,
    ) -> Result<NavigationResult> {
        let handle = self.handle(id)?;
        let writer = handle.writer().await;
        let (from, decision) = writer
            .read(|s| {
                let from = from.unwrap_or(s.stage);
                (from, can_advance(s, from, to))
            })
            .await;

        match &decision {
            GateDecision::Allow { .. } => {
                writer.commit(|s| s.stage = to).await;
                tracing::info!("[PIPELINE] session {} moved {} -> {}", id, from, to);
                Ok(NavigationResult { stage: to, decision })
            }
            GateDecision::Deny { reason } => {
                tracing::info!(
                    "[PIPELINE] session {} blocked {} -> {}: {}",
                    id,
                    from,
                    to,
                    reason
                );
                let stage = writer.read(|s| s.stage).await;
                Ok(NavigationResult { stage, decision })
            }
        }
    }

    /// Runs director, translation, character art and compliance in order and
    /// replaces every generated document of the session.
    pub async fn generate(&self, id: SessionId, request: GenerationRequest) -> Result<GenerationResult> {
        let handle = self.handle(id)?;
        let config = GenerationConfig::from_request(request).map_err(NewsroomError::ValidationFailed)?;

        let writer = handle.writer().await;
        let (fact_sheet, decision) = writer
            .read(|s| {
                (
                    s.fact_sheet.clone(),
                    can_advance(s, WorkflowStage::Briefing, WorkflowStage::Script),
                )
            })
            .await;
        if let GateDecision::Deny { reason } = decision {
            tracing::warn!("[PIPELINE] generate refused for {}: {}", id, reason);
            return Err(NewsroomError::StageGateDenied { reason });
        }

        tracing::info!(
            "[PIPELINE] generating {} for session {} ({} languages)",
            config.video_format,
            id,
            config.languages.len()
        );
        let target_duration_secs = config.target_duration_secs();
        let draft = self
            .with_timeout(self.collaborators.script_writer.write_script(
                &fact_sheet,
                &config,
                target_duration_secs,
            ))
            .await
            .map_err(|e| NewsroomError::GenerationFailed(format!("script: {}", e)))?;
        validate_scenes(&draft.scenes)
            .map_err(|e| NewsroomError::GenerationFailed(format!("script: {}", e)))?;

        let mut breakdowns = BTreeMap::new();
        for language in &config.languages {
            let scenes = self
                .with_timeout(self.collaborators.translator.translate(&draft, *language))
                .await
                .map_err(|e| {
                    NewsroomError::GenerationFailed(format!("{} translation: {}", language.code(), e))
                })?;
            validate_translation(&draft.scenes, &scenes)
                .and_then(|_| validate_scenes(&scenes))
                .map_err(|e| {
                    NewsroomError::GenerationFailed(format!("{} translation: {}", language.code(), e))
                })?;
            breakdowns.insert(
                language.code().to_string(),
                SceneBreakdown {
                    project_id: format!("{}_{}", id, language.code()),
                    language: *language,
                    scenes,
                },
            );
        }

        let video_package = VideoPackage {
            master_script: draft.master_script.clone(),
            creative_notes: draft.creative_notes.clone(),
            target_duration_secs,
            breakdowns,
        };
        let mut warnings = video_package.duration_warnings();

        let roster = match CharacterRoster::from_candidates(draft.characters.clone()) {
            Ok(roster) => self.draw_characters(roster, &mut warnings).await,
            Err(e) => {
                tracing::warn!("[PIPELINE] character roster discarded: {}", e);
                warnings.push(format!("characters unavailable: {}", e));
                CharacterRoster::default()
            }
        };

        let (compliance_report, compliance_error) = match self.run_compliance(&video_package).await {
            Ok(report) => (Some(report), None),
            Err(e) => {
                tracing::warn!("[PIPELINE] compliance review failed for {}: {}", id, e);
                (None, Some(e.to_string()))
            }
        };

        writer
            .commit(|s| {
                s.config = Some(config);
                s.video_package = Some(video_package.clone());
                s.roster = roster.clone();
                s.compliance = compliance_report.clone();
                s.compliance_stale = false;
                s.preview = PreviewState::default();
                s.social = None;
                if s.stage < WorkflowStage::Script {
                    s.stage = WorkflowStage::Script;
                }
            })
            .await;

        tracing::info!(
            "[PIPELINE] session {} generated: {} languages, {} characters, compliance {}",
            id,
            video_package.breakdowns.len(),
            roster.characters.len(),
            match &compliance_report {
                Some(report) if report.passed => "passed",
                Some(_) => "failed",
                None => "pending",
            }
        );
        Ok(GenerationResult {
            video_package,
            compliance_report,
            compliance_error,
            character_roster: (!roster.characters.is_empty()).then_some(roster),
            warnings,
        })
    }

    async fn run_compliance(
        &self,
        package: &VideoPackage,
    ) -> std::result::Result<ComplianceReport, CollaboratorError> {
        if self.config.skip_sensitivity_check {
            return Ok(ComplianceReport::skipped(&self.config.standards));
        }
        self.with_timeout(
            self.collaborators
                .compliance
                .review(package, &self.config.standards),
        )
        .await
    }

    /// Reviews the current video package, edits included, and replaces the
    /// compliance report. A failed review leaves the previous report and its
    /// staleness untouched.
    pub async fn review_compliance(&self, id: SessionId) -> Result<ComplianceReport> {
        let handle = self.handle(id)?;
        let writer = handle.writer().await;
        let package = writer.read(|s| s.video_package.clone()).await.ok_or_else(|| {
            NewsroomError::ValidationFailed("no video package generated".to_string())
        })?;

        let report = self.run_compliance(&package).await.map_err(|e| {
            tracing::warn!("[PIPELINE] compliance re-review failed for {}: {}", id, e);
            NewsroomError::GenerationFailed(format!("compliance: {}", e))
        })?;
        writer
            .commit(|s| {
                s.compliance = Some(report.clone());
                s.compliance_stale = false;
            })
            .await;

        tracing::info!(
            "[PIPELINE] session {} compliance re-reviewed: {} ({} flags)",
            id,
            if report.passed { "passed" } else { "failed" },
            report.flags.len()
        );
        Ok(report)
    }

    /// Asks the avatar advisor which trusted presenters suit the session.
    /// Unknown ids are dropped; an empty or failed answer falls back to
    /// [`DEFAULT_AVATAR_IDS`].
    pub async fn recommend_avatars(
        &self,
        id: SessionId,
        preferences: AvatarPreferences,
    ) -> Result<AvatarRecommendation> {
        let fact_sheet = self.handle(id)?.snapshot().await.fact_sheet;
        let brief = AvatarBrief {
            fact_sheet,
            target_audience: preferences.target_audience,
            language: preferences.language,
            tone: preferences.tone,
            candidates: trusted_avatars(),
        };

        let recommended = match self
            .with_timeout(self.collaborators.avatars.recommend(&brief))
            .await
        {
            Ok(ids) => {
                let trusted = keep_trusted_avatars(&ids);
                if trusted.is_empty() && !ids.is_empty() {
                    tracing::warn!("[PIPELINE] no trusted avatar among {:?}", ids);
                }
                trusted
            }
            Err(e) => {
                tracing::warn!("[PIPELINE] avatar recommendation failed for {}: {}", id, e);
                Vec::new()
            }
        };

        let fallback = recommended.is_empty();
        let recommended_avatars = if fallback {
            DEFAULT_AVATAR_IDS.iter().map(|avatar_id| avatar_id.to_string()).collect()
        } else {
            recommended
        };
        tracing::info!(
            "[PIPELINE] session {} avatars recommended: {:?}{}",
            id,
            recommended_avatars,
            if fallback { " (defaults)" } else { "" }
        );
        Ok(AvatarRecommendation {
            recommended_avatars,
            fallback,
        })
    }

    async fn draw_characters(
        &self,
        mut roster: CharacterRoster,
        warnings: &mut Vec<String>,
    ) -> CharacterRoster {
        for character in roster.characters.iter_mut() {
            match self
                .with_timeout(self.collaborators.images.character_image(character))
                .await
            {
                Ok(image) => character.image = Some(image),
                Err(e) => {
                    tracing::warn!("[PIPELINE] no image for '{}': {}", character.role, e);
                    warnings.push(format!("image for '{}' unavailable", character.role));
                }
            }
        }
        roster
    }

    /// Routes a chat turn to the document named by `target`.
    pub async fn chat(
        &self,
        id: SessionId,
        target: ChatTarget,
        input: ChatInput,
        options: ChatOptions,
    ) -> Result<ChatReply> {
        if input.message.trim().is_empty() {
            return Err(NewsroomError::ValidationFailed("message is required".to_string()));
        }
        let handle = self.handle(id)?;
        let writer = handle.writer().await;
        tracing::info!("[PIPELINE] chat on {} for session {}", target, id);

        let reply = match target {
            ChatTarget::Factsheet => self.chat_fact_sheet(&writer, &input).await,
            ChatTarget::VideoPackage => {
                self.chat_video_package(&writer, &input, options.language_code)
                    .await
            }
            ChatTarget::Characters => self.chat_characters(&writer, &input).await,
            ChatTarget::PreviewFrames => self.chat_preview(&writer, &input).await,
            ChatTarget::Social => self.chat_social(&writer, &input, options.section).await,
        }?;

        if reply.updated {
            tracing::debug!("[PIPELINE] {} patch applied: {:?}", target, reply.applied_patch);
        }
        Ok(reply)
    }

    async fn propose<P: DocumentPatch>(
        &self,
        target: ChatTarget,
        document: &impl Serialize,
        input: &ChatInput,
        context: Option<String>,
    ) -> Result<Proposal<P>> {
        let document = serde_json::to_value(document)
            .map_err(|e| NewsroomError::GenerationFailed(e.to_string()))?;
        self.with_timeout(self.chat.propose::<P>(target, document, input, context))
            .await
            .map_err(|e| NewsroomError::GenerationFailed(format!("chat: {}", e)))
    }

    async fn chat_fact_sheet(&self, writer: &SessionWriter<'_>, input: &ChatInput) -> Result<ChatReply> {
        let sheet = writer.read(|s| s.fact_sheet.clone()).await;
        let proposal = self
            .propose::<FactSheetPatch>(ChatTarget::Factsheet, &sheet, input, None)
            .await?;
        let patch = match proposal.patch {
            PatchProposal::NoChange => return Ok(ChatReply::unchanged(proposal.reply, None)),
            PatchProposal::Invalid(reason) => {
                return Ok(ChatReply::unchanged(proposal.reply, Some(reason)))
            }
            PatchProposal::Valid(patch) => patch,
        };

        let mut updated = sheet;
        match patch.apply(&mut updated) {
            Err(reason) => Ok(ChatReply::unchanged(proposal.reply, Some(reason))),
            Ok(false) => Ok(ChatReply::unchanged(proposal.reply, None)),
            Ok(true) => {
                let mut reply = ChatReply::applied(proposal.reply, &patch);
                if updated.is_verified() {
                    updated.revoke_verification();
                    reply
                        .warnings
                        .push("fact sheet changed; officer verification is required again".to_string());
                }
                writer.commit(|s| s.fact_sheet = updated).await;
                Ok(reply)
            }
        }
    }

    async fn chat_video_package(
        &self,
        writer: &SessionWriter<'_>,
        input: &ChatInput,
        language_code: Option<String>,
    ) -> Result<ChatReply> {
        let (package, primary) = writer
            .read(|s| {
                (
                    s.video_package.clone(),
                    s.config.as_ref().map(|c| c.primary_language().code().to_string()),
                )
            })
            .await;
        let package = package.ok_or_else(|| {
            NewsroomError::ValidationFailed("no video package generated".to_string())
        })?;
        let language_code = language_code
            .or(primary)
            .ok_or_else(|| NewsroomError::ValidationFailed("no target language".to_string()))?;
        if package.breakdown(&language_code).is_none() {
            return Err(NewsroomError::ValidationFailed(format!(
                "no {} version in the video package",
                language_code
            )));
        }

        let context = Some(format!("Edits address the {} version", language_code));
        let proposal = self
            .propose::<VideoPackagePatch>(ChatTarget::VideoPackage, &package, input, context)
            .await?;
        let patch = match proposal.patch {
            PatchProposal::NoChange => return Ok(ChatReply::unchanged(proposal.reply, None)),
            PatchProposal::Invalid(reason) => {
                return Ok(ChatReply::unchanged(proposal.reply, Some(reason)))
            }
            PatchProposal::Valid(patch) => patch,
        };

        let mut updated = package;
        match patch.apply(&mut updated, &language_code) {
            Err(reason) => return Ok(ChatReply::unchanged(proposal.reply, Some(reason))),
            Ok(false) => return Ok(ChatReply::unchanged(proposal.reply, None)),
            Ok(true) => {}
        }
        let mut reply = ChatReply::applied(proposal.reply, &patch);
        reply.warnings = updated.duration_warnings();
        let had_report = writer
            .commit(|s| {
                s.video_package = Some(updated);
                s.invalidate_compliance();
                s.compliance.is_some()
            })
            .await;
        if had_report {
            reply
                .warnings
                .push("scenes changed; compliance review must be re-run".to_string());
        }
        Ok(reply)
    }

    async fn chat_characters(&self, writer: &SessionWriter<'_>, input: &ChatInput) -> Result<ChatReply> {
        let roster = writer.read(|s| s.roster.clone()).await;
        if roster.characters.is_empty() {
            return Err(NewsroomError::ValidationFailed(
                "no characters generated".to_string(),
            ));
        }
        let proposal = self
            .propose::<CharactersPatch>(ChatTarget::Characters, &roster, input, None)
            .await?;
        let patch = match proposal.patch {
            PatchProposal::NoChange => return Ok(ChatReply::unchanged(proposal.reply, None)),
            PatchProposal::Invalid(reason) => {
                return Ok(ChatReply::unchanged(proposal.reply, Some(reason)))
            }
            PatchProposal::Valid(patch) => patch,
        };

        let mut updated = roster;
        let redraw = match patch.apply(&mut updated) {
            Ok(redraw) => redraw,
            Err(reason) => return Ok(ChatReply::unchanged(proposal.reply, Some(reason))),
        };
        for role in &redraw {
            let Some(character) = updated.get_mut(role) else {
                continue;
            };
            let image = self
                .with_timeout(self.collaborators.images.character_image(character))
                .await
                .map_err(|e| NewsroomError::GenerationFailed(format!("image for '{}': {}", role, e)))?;
            character.image = Some(image);
        }

        writer.commit(|s| s.roster = updated).await;
        Ok(ChatReply::applied(proposal.reply, &patch))
    }

    async fn chat_preview(&self, writer: &SessionWriter<'_>, input: &ChatInput) -> Result<ChatReply> {
        let preview = writer.read(|s| s.preview.clone()).await;
        if preview.frames.is_empty() {
            return Err(NewsroomError::ValidationFailed(
                "no preview frames generated".to_string(),
            ));
        }
        let proposal = self
            .propose::<PreviewPatch>(ChatTarget::PreviewFrames, &preview.frames, input, None)
            .await?;
        let patch = match proposal.patch {
            PatchProposal::NoChange => return Ok(ChatReply::unchanged(proposal.reply, None)),
            PatchProposal::Invalid(reason) => {
                return Ok(ChatReply::unchanged(proposal.reply, Some(reason)))
            }
            PatchProposal::Valid(patch) => patch,
        };
        let changes = match patch.changes(&preview) {
            Ok(changes) => changes,
            Err(reason) => return Ok(ChatReply::unchanged(proposal.reply, Some(reason))),
        };

        let mut updated = preview;
        let now = Utc::now();
        let mut regenerated = Vec::with_capacity(changes.len());
        for change in &changes {
            let image = self
                .with_timeout(self.collaborators.images.scene_frame(
                    change.scene_id,
                    change.frame,
                    &change.prompt,
                ))
                .await
                .map_err(|e| {
                    NewsroomError::GenerationFailed(format!(
                        "scene {} {:?} frame: {}",
                        change.scene_id, change.frame, e
                    ))
                })?;
            let key = FrameKey {
                scene_id: change.scene_id,
                frame: change.frame,
            };
            if let Some(frame) = updated.frame_mut(key) {
                frame.visual_prompt = change.prompt.clone();
                frame.image = image;
                frame.refined_at = Some(now);
                regenerated.push(key);
            }
        }

        let reply = ChatReply::applied(proposal.reply, &patch);
        updated.record_refinement(RefinementEntry {
            timestamp: now,
            user_message: input.message.clone(),
            reply: reply.reply.clone(),
            updated_prompts: changes,
            regenerated_frames: regenerated,
        });
        writer.commit(|s| s.preview = updated).await;
        Ok(reply)
    }

    async fn chat_social(
        &self,
        writer: &SessionWriter<'_>,
        input: &ChatInput,
        section: SocialSection,
    ) -> Result<ChatReply> {
        let social = writer.read(|s| s.social.clone()).await.ok_or_else(|| {
            NewsroomError::ValidationFailed("no social package generated".to_string())
        })?;
        let context = Some(format!("Only the {} section may change", section));
        let proposal = self
            .propose::<SocialPatch>(ChatTarget::Social, &social, input, context)
            .await?;
        let patch = match proposal.patch {
            PatchProposal::NoChange => return Ok(ChatReply::unchanged(proposal.reply, None)),
            PatchProposal::Invalid(reason) => {
                return Ok(ChatReply::unchanged(proposal.reply, Some(reason)))
            }
            PatchProposal::Valid(patch) => patch,
        };

        let mut updated = social;
        if let Err(reason) = patch
            .check_section(section)
            .and_then(|_| patch.apply(&mut updated))
        {
            return Ok(ChatReply::unchanged(proposal.reply, Some(reason)));
        }
        writer.commit(|s| s.social = Some(updated)).await;
        Ok(ChatReply::applied(proposal.reply, &patch))
    }

    /// Draws start and end stills for every scene of one language version.
    pub async fn generate_previews(
        &self,
        id: SessionId,
        language_code: Option<String>,
    ) -> Result<PreviewState> {
        let handle = self.handle(id)?;
        let writer = handle.writer().await;
        let (package, primary) = writer
            .read(|s| {
                (
                    s.video_package.clone(),
                    s.config.as_ref().map(|c| c.primary_language().code().to_string()),
                )
            })
            .await;
        let package = package.ok_or_else(|| {
            NewsroomError::ValidationFailed("no video package generated".to_string())
        })?;
        let language_code = language_code
            .or(primary)
            .ok_or_else(|| NewsroomError::ValidationFailed("no target language".to_string()))?;
        let breakdown = package.breakdown(&language_code).ok_or_else(|| {
            NewsroomError::ValidationFailed(format!("no {} version in the video package", language_code))
        })?;

        let mut frames = Vec::with_capacity(breakdown.scenes.len() * 2);
        for scene in &breakdown.scenes {
            for frame in [FrameRole::Start, FrameRole::End] {
                let prompt = match frame {
                    FrameRole::Start => scene.visual_prompt.clone(),
                    FrameRole::End => format!("{}, closing moment of the scene", scene.visual_prompt),
                };
                let image = self
                    .with_timeout(self.collaborators.images.scene_frame(scene.scene_id, frame, &prompt))
                    .await
                    .map_err(|e| {
                        NewsroomError::GenerationFailed(format!(
                            "scene {} {:?} frame: {}",
                            scene.scene_id, frame, e
                        ))
                    })?;
                frames.push(PreviewFrame {
                    scene_id: scene.scene_id,
                    frame,
                    visual_prompt: prompt,
                    image,
                    generated_at: Utc::now(),
                    refined_at: None,
                });
            }
        }

        let preview = writer
            .commit(|s| {
                s.preview.replace_frames(&language_code, frames);
                s.preview.clone()
            })
            .await;
        tracing::info!(
            "[PIPELINE] session {} previews ready: {} frames ({})",
            id,
            preview.frames.len(),
            language_code
        );
        Ok(preview)
    }

    pub async fn generate_social(&self, id: SessionId, platform: SocialPlatform) -> Result<SocialPackage> {
        let handle = self.handle(id)?;
        let writer = handle.writer().await;
        let (fact_sheet, package) = writer
            .read(|s| (s.fact_sheet.clone(), s.video_package.clone()))
            .await;
        let package = package.ok_or_else(|| {
            NewsroomError::ValidationFailed("no video package generated".to_string())
        })?;

        let mut social = self
            .with_timeout(
                self.collaborators
                    .social
                    .write_social(&fact_sheet, &package, platform),
            )
            .await
            .map_err(|e| NewsroomError::GenerationFailed(format!("social: {}", e)))?;
        social.platform = platform;
        social.normalize();

        writer.commit(|s| s.social = Some(social.clone())).await;
        tracing::info!("[PIPELINE] session {} social package for {}", id, platform);
        Ok(social)
    }

    pub async fn get_session(&self, id: SessionId) -> Result<Session> {
        Ok(self.handle(id)?.snapshot().await)
    }

    pub async fn list_sessions(&self) -> Vec<SessionSummary> {
        registry::summaries(self.registry.as_ref()).await
    }

    pub async fn request_render(&self, id: SessionId, language_code: &str) -> Result<RenderTicket> {
        self.renders.request(id, language_code).await
    }

    pub async fn render_complete(&self, project_id: &str, outcome: RenderOutcome) -> Result<CompletionAck> {
        self.renders.report_completion(project_id, outcome).await
    }

    pub async fn render_status(&self, project_id: &str) -> Result<RenderStatusView> {
        self.renders.poll(project_id).await
    }
}

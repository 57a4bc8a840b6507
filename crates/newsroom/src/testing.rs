//! Scripted in-memory collaborators for tests.

use std::{
    collections::{BTreeMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{
    collaborators::{
        AvatarAdvisor, AvatarBrief, ChatModel, ChatRequest, CollaboratorError, Collaborators, ComplianceReviewer,
        ExtractionRequest, FactExtractor, ImageGenerator, RenderRequest, Renderer, ScriptWriter,
        SocialCopywriter, Translator,
    },
    config::NewsroomConfig,
    models::{
        characters::sample_characters, fact_sheet::sample_fact_sheet, generation::sample_request,
        social::sample_social_package, video::sample_scenes, AnalysisStatus, CategoryAnalysis,
        Character, CharacterRoster, ComplianceFlag, ComplianceReport, FactSheet, FrameRole,
        GenerationConfig, ImageRef, Language, Scene, SceneBreakdown, ScriptDraft, Severity,
        SocialPackage, SocialPlatform, VideoPackage,
    },
    orchestrator::PipelineOrchestrator,
    registry::InMemorySessionRegistry,
    session::{Session, SessionId},
};

pub struct FakeExtractor {
    pub fail: AtomicBool,
    pub thoughts: Vec<String>,
}

impl Default for FakeExtractor {
    fn default() -> Self {
        Self {
            fail: AtomicBool::new(false),
            thoughts: vec![
                "Identifying scam pattern".to_string(),
                "Cross-checking police advisories".to_string(),
            ],
        }
    }
}

#[async_trait]
impl FactExtractor for FakeExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> Result<FactSheet, CollaboratorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Rejected("model quota exhausted".to_string()));
        }
        let mut sheet = sample_fact_sheet();
        if request.deep_research {
            sheet.psychological_exploit = Some("Social obligation to open invitations".to_string());
        }
        Ok(sheet)
    }

    async fn extract_streaming(
        &self,
        request: &ExtractionRequest,
        thoughts: mpsc::Sender<String>,
    ) -> Result<FactSheet, CollaboratorError> {
        for thought in &self.thoughts {
            let _ = thoughts.send(thought.clone()).await;
        }
        self.extract(request).await
    }
}

pub struct FakeScriptWriter {
    pub scenes: u32,
    pub characters: Mutex<Vec<Character>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl Default for FakeScriptWriter {
    fn default() -> Self {
        Self {
            scenes: 4,
            characters: Mutex::new(sample_characters()),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ScriptWriter for FakeScriptWriter {
    async fn write_script(
        &self,
        fact_sheet: &FactSheet,
        _config: &GenerationConfig,
        _target_duration_secs: u32,
    ) -> Result<ScriptDraft, CollaboratorError> {
        let run = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Malformed("director returned prose".to_string()));
        }
        Ok(ScriptDraft {
            master_script: format!("{} (draft {})", fact_sheet.scam_name, run),
            creative_notes: Some("Vertical framing, tense pacing".to_string()),
            scenes: sample_scenes(self.scenes),
            characters: self.characters.lock().unwrap().clone(),
        })
    }
}

#[derive(Default)]
pub struct FakeTranslator {
    /// Drop the last scene for this language.
    pub truncate: Mutex<Option<Language>>,
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(
        &self,
        draft: &ScriptDraft,
        language: Language,
    ) -> Result<Vec<Scene>, CollaboratorError> {
        let mut scenes: Vec<Scene> = draft
            .scenes
            .iter()
            .map(|scene| Scene {
                audio_script: format!("[{}] {}", language.code(), scene.audio_script),
                ..scene.clone()
            })
            .collect();
        if *self.truncate.lock().unwrap() == Some(language) {
            scenes.pop();
        }
        Ok(scenes)
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeImages {
    fn next_url(&self, name: &str) -> Result<ImageRef, CollaboratorError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Status {
                status: 503,
                body: "image backend busy".to_string(),
            });
        }
        Ok(ImageRef::Url {
            url: format!("https://img.test/{}/{}.png", name, n),
        })
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn character_image(&self, character: &Character) -> Result<ImageRef, CollaboratorError> {
        self.next_url(&character.role.replace(' ', "-").to_lowercase())
    }

    async fn scene_frame(
        &self,
        scene_id: u32,
        frame: FrameRole,
        _prompt: &str,
    ) -> Result<ImageRef, CollaboratorError> {
        self.next_url(&format!("scene{}-{:?}", scene_id, frame).to_lowercase())
    }
}

#[derive(Default)]
pub struct FakeCompliance {
    pub fail: AtomicBool,
    pub flag_critical: AtomicBool,
    pub runs: AtomicUsize,
}

#[async_trait]
impl ComplianceReviewer for FakeCompliance {
    async fn review(
        &self,
        _package: &VideoPackage,
        standards: &[String],
    ) -> Result<ComplianceReport, CollaboratorError> {
        let run = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Timeout(60));
        }
        let critical = self.flag_critical.load(Ordering::SeqCst);
        let flags = if critical {
            vec![ComplianceFlag {
                severity: Severity::Critical,
                issue_type: "3R".to_string(),
                description: "Scammer drawn with ethnic markers".to_string(),
                scene_id: Some(2),
                suggested_fix: Some("Keep the scammer featureless".to_string()),
                regulation_reference: None,
            }]
        } else {
            Vec::new()
        };
        Ok(ComplianceReport {
            passed: !critical,
            flags,
            detailed_analysis: vec![CategoryAnalysis {
                category: "Race".to_string(),
                status: if critical {
                    AnalysisStatus::Flagged
                } else {
                    AnalysisStatus::Passed
                },
                analysis: "Checked depictions".to_string(),
                elements_reviewed: vec!["characters".to_string()],
            }],
            compliance_summary: format!("review run {}", run),
            checked_against: standards.to_vec(),
        })
    }
}

#[derive(Default)]
pub struct FakeSocial;

#[async_trait]
impl SocialCopywriter for FakeSocial {
    async fn write_social(
        &self,
        _fact_sheet: &FactSheet,
        _package: &VideoPackage,
        platform: SocialPlatform,
    ) -> Result<SocialPackage, CollaboratorError> {
        Ok(SocialPackage {
            platform,
            ..sample_social_package()
        })
    }
}

/// Replies in order; falls back to a plain acknowledgement when exhausted.
#[derive(Default)]
pub struct ScriptedChat {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, request: &ChatRequest) -> Result<String, CollaboratorError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "Noted.".to_string()))
    }
}

/// Answers with `ids`, or fails when `fail` is set.
pub struct FakeAvatarAdvisor {
    pub ids: Mutex<Vec<String>>,
    pub fail: AtomicBool,
    briefs: Mutex<Vec<AvatarBrief>>,
}

impl Default for FakeAvatarAdvisor {
    fn default() -> Self {
        Self {
            ids: Mutex::new(vec![
                "officer_chinese_female_01".to_string(),
                "officer_malay_male_01".to_string(),
            ]),
            fail: AtomicBool::new(false),
            briefs: Mutex::new(Vec::new()),
        }
    }
}

impl FakeAvatarAdvisor {
    pub fn briefs(&self) -> Vec<AvatarBrief> {
        self.briefs.lock().unwrap().clone()
    }
}

#[async_trait]
impl AvatarAdvisor for FakeAvatarAdvisor {
    async fn recommend(&self, brief: &AvatarBrief) -> Result<Vec<String>, CollaboratorError> {
        self.briefs.lock().unwrap().push(brief.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Malformed("advisor returned prose".to_string()));
        }
        Ok(self.ids.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    fail_with: Option<String>,
    dispatched: Mutex<Vec<RenderRequest>>,
}

impl FakeRenderer {
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_with: Some(reason.to_string()),
            dispatched: Mutex::new(Vec::new()),
        }
    }

    pub fn dispatched(&self) -> Vec<RenderRequest> {
        self.dispatched.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn dispatch(&self, request: &RenderRequest) -> Result<(), CollaboratorError> {
        self.dispatched.lock().unwrap().push(request.clone());
        match &self.fail_with {
            Some(reason) => Err(CollaboratorError::Rejected(reason.clone())),
            None => Ok(()),
        }
    }
}

/// One fake of every collaborator, kept around so tests can steer them.
#[derive(Default)]
pub struct Fakes {
    pub extractor: Arc<FakeExtractor>,
    pub script_writer: Arc<FakeScriptWriter>,
    pub translator: Arc<FakeTranslator>,
    pub images: Arc<FakeImages>,
    pub compliance: Arc<FakeCompliance>,
    pub social: Arc<FakeSocial>,
    pub chat: Arc<ScriptedChat>,
    pub avatars: Arc<FakeAvatarAdvisor>,
    pub renderer: Arc<FakeRenderer>,
}

impl Fakes {
    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            extractor: self.extractor.clone(),
            script_writer: self.script_writer.clone(),
            translator: self.translator.clone(),
            images: self.images.clone(),
            compliance: self.compliance.clone(),
            social: self.social.clone(),
            chat: self.chat.clone(),
            avatars: self.avatars.clone(),
            renderer: self.renderer.clone(),
        }
    }

    pub fn orchestrator(&self) -> PipelineOrchestrator {
        PipelineOrchestrator::new(
            NewsroomConfig::for_tests(),
            self.collaborators(),
            Arc::new(InMemorySessionRegistry::new()),
        )
    }
}

/// Verified session with a four-scene package in English and Malay and a cast of two.
pub fn produced_session() -> Session {
    let mut session = Session::new(SessionId::new(), sample_fact_sheet());
    session.fact_sheet.verify("OFC-7");
    let config = GenerationConfig::from_request(sample_request()).unwrap();
    let mut breakdowns = BTreeMap::new();
    for language in &config.languages {
        breakdowns.insert(
            language.code().to_string(),
            SceneBreakdown {
                project_id: session.project_id(language.code()),
                language: *language,
                scenes: sample_scenes(4),
            },
        );
    }
    session.video_package = Some(VideoPackage {
        master_script: "Master script".to_string(),
        creative_notes: None,
        target_duration_secs: config.target_duration_secs(),
        breakdowns,
    });
    session.config = Some(config);
    session.roster = CharacterRoster::from_candidates(sample_characters()).unwrap();
    session
}

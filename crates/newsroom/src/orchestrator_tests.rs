use std::{sync::atomic::Ordering, sync::Arc};

use serde_json::json;

use crate::{
    chat::{ChatInput, ChatTarget},
    models::{
        generation::sample_request, FrameRole, IntakeInput, Language, RenderOutcome,
        RenderStatus, RenderedOutput, ScamCategory, SocialPlatform, SocialSection, SourceType,
        TargetAudience, DEFAULT_AVATAR_IDS,
    },
    orchestrator::{AvatarPreferences, ChatOptions, IntakeEvent, PipelineOrchestrator},
    session::{SessionId, WorkflowStage},
    stage_gate::{GateDecision, REASON_COMPLIANCE_PENDING, REASON_NOT_VERIFIED},
    testing::Fakes,
    NewsroomError,
};

fn apk_report() -> IntakeInput {
    IntakeInput {
        source_type: SourceType::ManualDescription,
        content: "Victims receive an APK wedding invitation scam on WhatsApp that steals banking OTPs"
            .to_string(),
        additional_context: None,
        officer_id: Some("OFC-7".to_string()),
        use_deep_research: None,
    }
}

fn update_block(updates: serde_json::Value) -> String {
    format!("```json\n{}\n```", json!({ "updates": updates }))
}

async fn intake(orch: &PipelineOrchestrator) -> SessionId {
    orch.intake(apk_report()).await.unwrap().session_id
}

async fn generated(orch: &PipelineOrchestrator) -> SessionId {
    let id = intake(orch).await;
    orch.verify(id, "OFC-7", None).await.unwrap();
    orch.generate(id, sample_request()).await.unwrap();
    id
}

#[tokio::test]
async fn scenario_a_intake_creates_unverified_session() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();

    let result = orch.intake(apk_report()).await.unwrap();
    assert_eq!(result.fact_sheet.category, ScamCategory::Phishing);
    assert!(!result.fact_sheet.verified_by_officer);
    assert!(result.fact_sheet.verification_timestamp.is_none());

    let session = orch.get_session(result.session_id).await.unwrap();
    assert_eq!(session.stage, WorkflowStage::Briefing);
    assert_eq!(orch.list_sessions().await.len(), 1);
}

#[tokio::test]
async fn failed_or_short_intake_leaves_no_session() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();

    let mut short = apk_report();
    short.content = "APK scam".to_string();
    assert!(matches!(
        orch.intake(short).await,
        Err(NewsroomError::ValidationFailed(_))
    ));

    fakes.extractor.fail.store(true, Ordering::SeqCst);
    assert!(matches!(
        orch.intake(apk_report()).await,
        Err(NewsroomError::ExtractionFailed(_))
    ));
    assert!(orch.list_sessions().await.is_empty());
}

#[tokio::test]
async fn streaming_intake_ends_with_the_same_fact_sheet() {
    let fakes = Fakes::default();
    let orch = Arc::new(fakes.orchestrator());

    let mut events = orch.intake_stream(apk_report());
    let mut thoughts = Vec::new();
    let mut result = None;
    while let Some(event) = events.recv().await {
        match event {
            IntakeEvent::Thought { message } => thoughts.push(message),
            IntakeEvent::Result { session_id, fact_sheet } => result = Some((session_id, fact_sheet)),
            IntakeEvent::Error { message } => panic!("unexpected error: {}", message),
        }
    }

    assert_eq!(thoughts.len(), 2);
    let (session_id, fact_sheet) = result.unwrap();
    assert_eq!(fact_sheet, orch.intake(apk_report()).await.unwrap().fact_sheet);
    assert!(orch.get_session(session_id).await.is_ok());
}

#[tokio::test]
async fn streaming_intake_reports_failure_as_event() {
    let fakes = Fakes::default();
    fakes.extractor.fail.store(true, Ordering::SeqCst);
    let orch = Arc::new(fakes.orchestrator());

    let mut events = orch.intake_stream(apk_report());
    let mut last = None;
    while let Some(event) = events.recv().await {
        last = Some(event);
    }
    assert!(matches!(last, Some(IntakeEvent::Error { .. })));
    assert!(orch.list_sessions().await.is_empty());
}

#[tokio::test]
async fn scenario_b_verify_unlocks_briefing() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;

    let denied = orch.navigate(id, None, WorkflowStage::Configuration).await.unwrap();
    assert_eq!(
        denied.decision,
        GateDecision::Deny {
            reason: REASON_NOT_VERIFIED.to_string()
        }
    );
    assert_eq!(denied.stage, WorkflowStage::Briefing);

    let verified = orch.verify(id, "OFC-7", None).await.unwrap();
    assert!(verified.verified);
    assert!(verified.fact_sheet.verified_by_officer);
    assert!(verified.fact_sheet.verification_timestamp.is_some());

    let moved = orch.navigate(id, None, WorkflowStage::Configuration).await.unwrap();
    assert!(moved.decision.is_allowed());
    assert_eq!(orch.get_session(id).await.unwrap().stage, WorkflowStage::Configuration);

    let back = orch.navigate(id, None, WorkflowStage::Briefing).await.unwrap();
    assert!(back.decision.is_allowed());
}

#[tokio::test]
async fn verify_applies_corrections_or_rejects_them_whole() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;

    let bad = orch
        .verify(id, "OFC-7", Some(json!({"scam_name": "X", "verified_by_officer": false})))
        .await;
    assert!(matches!(bad, Err(NewsroomError::ValidationFailed(_))));
    let session = orch.get_session(id).await.unwrap();
    assert!(!session.fact_sheet.is_verified());
    assert_ne!(session.fact_sheet.scam_name, "X");

    let ok = orch
        .verify(id, "OFC-7", Some(json!({"red_flag": "Wedding cards never need an installer"})))
        .await
        .unwrap();
    assert_eq!(ok.fact_sheet.red_flag, "Wedding cards never need an installer");
    assert_eq!(ok.fact_sheet.verified_by.as_deref(), Some("OFC-7"));

    assert!(matches!(
        orch.verify(SessionId::new(), "OFC-7", None).await,
        Err(NewsroomError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn scenario_c_generate_before_verify_is_denied() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;

    match orch.generate(id, sample_request()).await {
        Err(NewsroomError::StageGateDenied { reason }) => assert_eq!(reason, REASON_NOT_VERIFIED),
        other => panic!("expected gate denial, got {:?}", other.map(|_| ())),
    }
    let session = orch.get_session(id).await.unwrap();
    assert!(session.video_package.is_none());
    assert_eq!(fakes.script_writer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn generate_persists_every_output() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;
    orch.verify(id, "OFC-7", None).await.unwrap();

    let result = orch.generate(id, sample_request()).await.unwrap();
    assert_eq!(result.video_package.breakdowns.len(), 2);
    let bm = result.video_package.breakdown("bm").unwrap();
    assert_eq!(bm.scenes.len(), 4);
    assert!(bm.scenes[0].audio_script.starts_with("[bm]"));
    assert_eq!(bm.project_id, format!("{}_bm", id));
    assert!(result.compliance_report.as_ref().unwrap().passed);
    let roster = result.character_roster.unwrap();
    assert!(roster.characters.iter().all(|c| c.image.is_some()));

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.stage, WorkflowStage::Script);
    assert!(session.compliance_current());
    assert_eq!(session.config.unwrap().languages, vec![Language::English, Language::Malay]);
}

#[tokio::test]
async fn regeneration_replaces_package_and_report_wholesale() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;

    fakes.chat.push(format!(
        "Updated.\n{}",
        update_block(json!({"scenes": {"3": {"text_overlay": "EDITED"}}}))
    ));
    orch.chat(id, ChatTarget::VideoPackage, ChatInput::new("edit scene 3"), ChatOptions::default())
        .await
        .unwrap();
    assert!(orch.get_session(id).await.unwrap().compliance_stale);

    let result = orch.generate(id, sample_request()).await.unwrap();
    let session = orch.get_session(id).await.unwrap();
    let package = session.video_package.unwrap();
    assert_eq!(package, result.video_package);
    assert!(package.master_script.ends_with("(draft 2)"));
    assert_eq!(package.breakdown("en").unwrap().scenes[2].text_overlay.as_deref(), Some("Overlay 3"));
    assert_eq!(session.compliance.unwrap().compliance_summary, "review run 2");
    assert!(!session.compliance_stale);
}

#[tokio::test]
async fn compliance_failure_keeps_script_outputs() {
    let fakes = Fakes::default();
    fakes.compliance.fail.store(true, Ordering::SeqCst);
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;

    let session = orch.get_session(id).await.unwrap();
    assert!(session.video_package.is_some());
    assert_eq!(session.roster.characters.len(), 2);
    assert!(session.compliance.is_none());

    fakes.compliance.fail.store(false, Ordering::SeqCst);
    let rerun = orch.generate(id, sample_request()).await.unwrap();
    assert!(rerun.compliance_error.is_none());
}

#[tokio::test]
async fn compliance_error_is_reported_in_result() {
    let fakes = Fakes::default();
    fakes.compliance.fail.store(true, Ordering::SeqCst);
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;
    orch.verify(id, "OFC-7", None).await.unwrap();

    let result = orch.generate(id, sample_request()).await.unwrap();
    assert!(result.compliance_report.is_none());
    assert!(result.compliance_error.unwrap().contains("timed out"));
}

#[tokio::test]
async fn broken_translation_changes_nothing() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;
    let before = orch.get_session(id).await.unwrap();

    *fakes.translator.truncate.lock().unwrap() = Some(Language::Malay);
    assert!(matches!(
        orch.generate(id, sample_request()).await,
        Err(NewsroomError::GenerationFailed(_))
    ));
    let after = orch.get_session(id).await.unwrap();
    assert_eq!(after.video_package, before.video_package);
    assert_eq!(after.compliance, before.compliance);
}

#[tokio::test]
async fn missing_characters_are_a_warning_not_a_failure() {
    let fakes = Fakes::default();
    fakes.script_writer.characters.lock().unwrap().truncate(1);
    fakes.images.fail.store(true, Ordering::SeqCst);
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;
    orch.verify(id, "OFC-7", None).await.unwrap();

    let result = orch.generate(id, sample_request()).await.unwrap();
    assert!(result.character_roster.is_none());
    assert!(result.warnings.iter().any(|w| w.contains("characters unavailable")));
}

#[tokio::test]
async fn scenario_d_scene_patch_touches_only_scene_two() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;
    let before = orch.get_session(id).await.unwrap().video_package.unwrap();

    fakes.chat.push(format!(
        "Scene 2 now opens with a warning.\n{}",
        update_block(json!({"scenes": {"2": {"text_overlay": "SCAM ALERT", "background_music_mood": "urgent"}}}))
    ));
    let reply = orch
        .chat(
            id,
            ChatTarget::VideoPackage,
            ChatInput::new("make scene 2 urgent, overlay text SCAM ALERT"),
            ChatOptions::default(),
        )
        .await
        .unwrap();

    assert!(reply.updated);
    assert_eq!(reply.reply, "Scene 2 now opens with a warning.");
    let applied = reply.applied_patch.unwrap();
    assert_eq!(applied["scenes"]["2"]["text_overlay"], "SCAM ALERT");

    let session = orch.get_session(id).await.unwrap();
    let after = session.video_package.unwrap();
    let (old, new) = (&before.breakdown("en").unwrap().scenes, &after.breakdown("en").unwrap().scenes);
    assert_eq!(new.len(), 4);
    for idx in [0, 2, 3] {
        assert_eq!(old[idx], new[idx]);
    }
    assert_eq!(new[1].text_overlay.as_deref(), Some("SCAM ALERT"));
    assert_eq!(new[1].background_music_mood.as_deref(), Some("urgent"));
    assert_eq!(after.breakdown("bm").unwrap().scenes[1].text_overlay.as_deref(), Some("Overlay 2"));
    assert!(session.compliance_stale);
}

#[tokio::test]
async fn patch_outside_whitelist_is_not_applied() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;
    let before = orch.get_session(id).await.unwrap();

    fakes.chat.push(format!(
        "Done.\n{}",
        update_block(json!({"scenes": {"2": {"text_overlay": "SCAM ALERT", "camera_angle": "low"}}}))
    ));
    let reply = orch
        .chat(id, ChatTarget::VideoPackage, ChatInput::new("low angle"), ChatOptions::default())
        .await
        .unwrap();
    assert!(!reply.updated);
    assert!(reply.rejection.is_some());
    assert_eq!(reply.reply, "Done.");

    fakes.chat.push(format!("Verified!\n{}", update_block(json!({"verified_by_officer": true}))));
    let reply = orch
        .chat(id, ChatTarget::Factsheet, ChatInput::new("mark verified"), ChatOptions::default())
        .await
        .unwrap();
    assert!(!reply.updated);

    let after = orch.get_session(id).await.unwrap();
    assert_eq!(after.video_package, before.video_package);
    assert_eq!(after.fact_sheet, before.fact_sheet);
    assert!(!after.compliance_stale);
}

#[tokio::test]
async fn fact_sheet_edit_requires_reverification() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;
    orch.verify(id, "OFC-7", None).await.unwrap();

    fakes.chat.push(format!(
        "Renamed.\n{}",
        update_block(json!({"scam_name": "Digital Wedding Card APK"}))
    ));
    let reply = orch
        .chat(id, ChatTarget::Factsheet, ChatInput::new("rename it"), ChatOptions::default())
        .await
        .unwrap();
    assert!(reply.updated);
    assert_eq!(reply.warnings.len(), 1);

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(session.fact_sheet.scam_name, "Digital Wedding Card APK");
    assert!(!session.fact_sheet.verified_by_officer);
    assert!(session.fact_sheet.verification_timestamp.is_none());
    assert!(!orch
        .navigate(id, Some(WorkflowStage::Briefing), WorkflowStage::Configuration)
        .await
        .unwrap()
        .decision
        .is_allowed());
}

#[tokio::test]
async fn character_edits_redraw_addressed_roles_only() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;
    let before = orch.get_session(id).await.unwrap().roster;

    fakes.chat.push(format!(
        "Redrawn.\n{}",
        update_block(json!({"characters": {"Fake courier": {"description": "Shadowy figure in a courier vest"}}}))
    ));
    let reply = orch
        .chat(id, ChatTarget::Characters, ChatInput::new("courier vest"), ChatOptions::default())
        .await
        .unwrap();
    assert!(reply.updated);

    let after = orch.get_session(id).await.unwrap().roster;
    assert_eq!(after.characters[0], before.characters[0]);
    assert_eq!(after.characters[1].description, "Shadowy figure in a courier vest");
    assert_ne!(after.characters[1].image, before.characters[1].image);

    fakes.images.fail.store(true, Ordering::SeqCst);
    fakes.chat.push(format!(
        "Redrawn.\n{}",
        update_block(json!({"characters": {"Retired nurse": {"regenerate_image": true}}}))
    ));
    assert!(matches!(
        orch.chat(id, ChatTarget::Characters, ChatInput::new("again"), ChatOptions::default())
            .await,
        Err(NewsroomError::GenerationFailed(_))
    ));
    assert_eq!(orch.get_session(id).await.unwrap().roster, after);
}

#[tokio::test]
async fn preview_refinement_is_logged() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;

    let preview = orch.generate_previews(id, None).await.unwrap();
    assert_eq!(preview.frames.len(), 8);
    assert_eq!(preview.language_code.as_deref(), Some("en"));

    fakes.chat.push("Which frame?".to_string());
    let reply = orch
        .chat(id, ChatTarget::PreviewFrames, ChatInput::new("darker"), ChatOptions::default())
        .await
        .unwrap();
    assert!(!reply.updated);

    fakes.chat.push(format!(
        "Scene 1 ends on a cracked phone now.\n{}",
        update_block(json!({"frames": {"1": {"end": "Cracked phone screen, red glow"}}}))
    ));
    let reply = orch
        .chat(id, ChatTarget::PreviewFrames, ChatInput::new("end scene 1 on a cracked phone"), ChatOptions::default())
        .await
        .unwrap();
    assert!(reply.updated);

    let session = orch.get_session(id).await.unwrap();
    let history = session.preview.refinement_history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].regenerated_frames.len(), 1);
    assert_eq!(history[0].regenerated_frames[0].frame, FrameRole::End);
    let end = session
        .preview
        .frames
        .iter()
        .find(|f| f.scene_id == 1 && f.frame == FrameRole::End)
        .unwrap();
    assert_eq!(end.visual_prompt, "Cracked phone screen, red glow");
    assert!(end.refined_at.is_some());
    let start = session
        .preview
        .frames
        .iter()
        .find(|f| f.scene_id == 1 && f.frame == FrameRole::Start)
        .unwrap();
    assert!(start.refined_at.is_none());
}

#[tokio::test]
async fn social_chat_is_scoped_to_section() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;

    let social = orch.generate_social(id, SocialPlatform::Tiktok).await.unwrap();
    assert_eq!(social.platform, SocialPlatform::Tiktok);

    fakes.chat.push(format!(
        "New tags.\n{}",
        update_block(json!({"hashtags": {"niche_hashtags": ["APKScam"]}, "posting_notes": "Post at 9pm"}))
    ));
    let reply = orch
        .chat(
            id,
            ChatTarget::Social,
            ChatInput::new("more niche tags"),
            ChatOptions {
                section: SocialSection::Hashtags,
                ..ChatOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(!reply.updated);
    assert!(reply.rejection.unwrap().contains("posting_notes"));

    fakes.chat.push(format!(
        "New tags.\n{}",
        update_block(json!({"hashtags": {"niche_hashtags": ["APKScam"]}}))
    ));
    let reply = orch
        .chat(
            id,
            ChatTarget::Social,
            ChatInput::new("more niche tags"),
            ChatOptions {
                section: SocialSection::Hashtags,
                ..ChatOptions::default()
            },
        )
        .await
        .unwrap();
    assert!(reply.updated);
    let session = orch.get_session(id).await.unwrap();
    assert!(session.social.unwrap().hashtags.hashtag_string.contains("#APKScam"));
}

#[tokio::test]
async fn scenario_e_double_completion_keeps_first_output() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;

    let ticket = orch.request_render(id, "en").await.unwrap();
    let first = RenderOutcome::Completed {
        output: RenderedOutput::Url {
            url: "https://cdn.test/en.mp4".to_string(),
        },
    };
    let ack = orch.render_complete(&ticket.project_id, first.clone()).await.unwrap();
    assert_eq!(ack.status, RenderStatus::Completed);

    let second = RenderOutcome::Completed {
        output: RenderedOutput::Object {
            bucket: "renders".to_string(),
            key: "other.mp4".to_string(),
        },
    };
    assert!(matches!(
        orch.render_complete(&ticket.project_id, second).await,
        Err(NewsroomError::RenderAlreadyFinalized(_))
    ));
    assert!(orch.render_complete(&ticket.project_id, first).await.unwrap().duplicate);

    let status = orch.render_status(&ticket.project_id).await.unwrap();
    assert_eq!(status.status, RenderStatus::Completed);
    assert_eq!(
        status.output,
        Some(RenderedOutput::Url {
            url: "https://cdn.test/en.mp4".to_string()
        })
    );
    let job = &orch.get_session(id).await.unwrap().render_jobs[&ticket.project_id];
    assert_eq!(job.status, RenderStatus::Completed);
}

#[tokio::test]
async fn publish_gate_follows_compliance_state() {
    let fakes = Fakes::default();
    fakes.compliance.flag_critical.store(true, Ordering::SeqCst);
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;

    let decision = orch
        .navigate(id, Some(WorkflowStage::Compliance), WorkflowStage::Publish)
        .await
        .unwrap()
        .decision;
    match decision {
        GateDecision::Allow { warnings } => assert_eq!(warnings.len(), 1),
        other => panic!("expected warning, got {:?}", other),
    }

    fakes.chat.push(format!(
        "Adjusted.\n{}",
        update_block(json!({"scenes": {"2": {"visual_prompt": "Featureless silhouette"}}}))
    ));
    orch.chat(id, ChatTarget::VideoPackage, ChatInput::new("fix scene 2"), ChatOptions::default())
        .await
        .unwrap();
    let decision = orch
        .navigate(id, Some(WorkflowStage::Compliance), WorkflowStage::Publish)
        .await
        .unwrap()
        .decision;
    assert_eq!(
        decision,
        GateDecision::Deny {
            reason: REASON_COMPLIANCE_PENDING.to_string()
        }
    );
}

async fn leave_compliance(orch: &PipelineOrchestrator, id: SessionId) -> GateDecision {
    orch.navigate(id, Some(WorkflowStage::Compliance), WorkflowStage::Publish)
        .await
        .unwrap()
        .decision
}

#[tokio::test]
async fn edited_package_is_re_reviewed_in_place() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;

    fakes.chat.push(format!(
        "Scene 2 now warns.\n{}",
        update_block(json!({"scenes": {"2": {"text_overlay": "SCAM ALERT"}}}))
    ));
    orch.chat(id, ChatTarget::VideoPackage, ChatInput::new("overlay SCAM ALERT"), ChatOptions::default())
        .await
        .unwrap();
    assert_eq!(
        leave_compliance(&orch, id).await,
        GateDecision::Deny {
            reason: REASON_COMPLIANCE_PENDING.to_string()
        }
    );

    let report = orch.review_compliance(id).await.unwrap();
    assert!(report.passed);
    assert_eq!(report.compliance_summary, "review run 2");
    assert!(matches!(leave_compliance(&orch, id).await, GateDecision::Allow { .. }));

    let session = orch.get_session(id).await.unwrap();
    assert!(session.compliance_current());
    let scenes = &session.video_package.unwrap().breakdowns["en"].scenes;
    assert_eq!(scenes[1].text_overlay.as_deref(), Some("SCAM ALERT"));
    assert_eq!(fakes.script_writer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_review_can_be_retried_without_regenerating() {
    let fakes = Fakes::default();
    fakes.compliance.fail.store(true, Ordering::SeqCst);
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;
    assert!(matches!(leave_compliance(&orch, id).await, GateDecision::Deny { .. }));

    assert!(matches!(
        orch.review_compliance(id).await,
        Err(NewsroomError::GenerationFailed(_))
    ));
    assert!(orch.get_session(id).await.unwrap().compliance.is_none());

    fakes.compliance.fail.store(false, Ordering::SeqCst);
    orch.review_compliance(id).await.unwrap();
    assert!(matches!(leave_compliance(&orch, id).await, GateDecision::Allow { .. }));
    assert_eq!(fakes.script_writer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn review_needs_a_package() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;
    assert!(matches!(
        orch.review_compliance(id).await,
        Err(NewsroomError::ValidationFailed(_))
    ));
    assert!(matches!(
        orch.review_compliance(SessionId::new()).await,
        Err(NewsroomError::SessionNotFound(_))
    ));
    assert_eq!(fakes.compliance.runs.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn repeating_current_scene_values_keeps_review_current() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = generated(&orch).await;

    fakes.chat.push(format!(
        "Already says that.\n{}",
        update_block(json!({"scenes": {"2": {"text_overlay": "Overlay 2"}}}))
    ));
    let reply = orch
        .chat(id, ChatTarget::VideoPackage, ChatInput::new("overlay 2 please"), ChatOptions::default())
        .await
        .unwrap();
    assert!(!reply.updated);
    assert!(reply.rejection.is_none());
    assert!(orch.get_session(id).await.unwrap().compliance_current());
}

#[tokio::test]
async fn avatar_recommendation_keeps_only_trusted_ids() {
    let fakes = Fakes::default();
    *fakes.avatars.ids.lock().unwrap() = vec![
        "officer_indian_female_01".to_string(),
        "influencer_07".to_string(),
        "officer_indian_female_01".to_string(),
        "officer_indian_male_01".to_string(),
    ];
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;

    let preferences = AvatarPreferences {
        target_audience: Some(TargetAudience::Elderly),
        language: Some(Language::Tamil),
        tone: None,
    };
    let recommendation = orch.recommend_avatars(id, preferences).await.unwrap();
    assert_eq!(
        recommendation.recommended_avatars,
        vec!["officer_indian_female_01", "officer_indian_male_01"]
    );
    assert!(!recommendation.fallback);

    let brief = &fakes.avatars.briefs()[0];
    assert_eq!(brief.language, Some(Language::Tamil));
    assert_eq!(brief.candidates.len(), 6);
    assert_eq!(brief.fact_sheet.category, ScamCategory::Phishing);
}

#[tokio::test]
async fn avatar_recommendation_falls_back_to_defaults() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = intake(&orch).await;

    *fakes.avatars.ids.lock().unwrap() = vec!["influencer_07".to_string()];
    let recommendation = orch
        .recommend_avatars(id, AvatarPreferences::default())
        .await
        .unwrap();
    assert!(recommendation.fallback);
    assert_eq!(recommendation.recommended_avatars, DEFAULT_AVATAR_IDS.to_vec());

    fakes.avatars.fail.store(true, Ordering::SeqCst);
    let recommendation = orch
        .recommend_avatars(id, AvatarPreferences::default())
        .await
        .unwrap();
    assert!(recommendation.fallback);
    assert_eq!(recommendation.recommended_avatars, DEFAULT_AVATAR_IDS.to_vec());

    assert!(matches!(
        orch.recommend_avatars(SessionId::new(), AvatarPreferences::default()).await,
        Err(NewsroomError::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn concurrent_writes_to_one_session_are_not_lost() {
    let fakes = Fakes::default();
    let orch = Arc::new(fakes.orchestrator());
    let id = generated(&orch).await;
    orch.navigate(id, None, WorkflowStage::Briefing).await.unwrap();

    fakes.chat.push(format!(
        "Done.\n{}",
        update_block(json!({"creative_notes": "Handheld camera"}))
    ));
    let chat = {
        let orch = orch.clone();
        tokio::spawn(async move {
            orch.chat(id, ChatTarget::VideoPackage, ChatInput::new("handheld"), ChatOptions::default())
                .await
        })
    };
    let verify = {
        let orch = orch.clone();
        tokio::spawn(async move { orch.verify(id, "OFC-9", Some(json!({"officer_notes": "Seen in Penang"}))).await })
    };
    assert!(chat.await.unwrap().unwrap().updated);
    verify.await.unwrap().unwrap();

    let session = orch.get_session(id).await.unwrap();
    assert_eq!(
        session.video_package.unwrap().creative_notes.as_deref(),
        Some("Handheld camera")
    );
    assert_eq!(session.fact_sheet.officer_notes.as_deref(), Some("Seen in Penang"));
    assert_eq!(session.fact_sheet.verified_by.as_deref(), Some("OFC-9"));
}

#[tokio::test]
async fn unknown_session_everywhere() {
    let fakes = Fakes::default();
    let orch = fakes.orchestrator();
    let id = SessionId::new();
    assert!(matches!(orch.get_session(id).await, Err(NewsroomError::SessionNotFound(_))));
    assert!(matches!(
        orch.generate(id, sample_request()).await,
        Err(NewsroomError::SessionNotFound(_))
    ));
    assert!(matches!(
        orch.chat(id, ChatTarget::Factsheet, ChatInput::new("hi"), ChatOptions::default()).await,
        Err(NewsroomError::SessionNotFound(_))
    ));
    assert!(matches!(
        orch.request_render(id, "en").await,
        Err(NewsroomError::SessionNotFound(_))
    ));
}

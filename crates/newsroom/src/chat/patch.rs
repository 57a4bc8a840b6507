//! Typed partial updates, one per chat-editable document.
//!
//! Every patch type rejects unknown keys, so deserializing a model's
//! `updates` object doubles as whitelist validation. Applying a patch is a
//! field-level replace: present fields overwrite, absent fields are kept.
//! Collection entries are addressed by their stable key (scene id, role,
//! caption index) and nothing outside the addressed entries moves.
//!
//! `apply` functions validate the whole patch before touching anything, so a
//! rejected patch leaves the target exactly as it was.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::models::{
    video::validate_scene_duration, CaptionOption, CharacterKind, CharacterRoster, FactSheet,
    FrameKey, FrameRole, PreviewState, PromptChange, ScamCategory, SocialPackage, SocialSection,
    ThumbnailRecommendation, Transition, TrendAnalysis, VideoPackage,
};

/// Common surface of the chat-editable patch types.
pub trait DocumentPatch: Serialize + DeserializeOwned + JsonSchema + Send + 'static {
    fn is_empty(&self) -> bool;
}

/// Validates an `updates` object against the patch type `P`.
pub fn parse_patch<P: DocumentPatch>(updates: Value) -> Result<P, String> {
    serde_json::from_value::<P>(updates).map_err(|e| format!("update rejected: {}", e))
}

/// JSON Schema for `P`, handed to the chat collaborator with each prompt.
pub fn patch_schema<P: DocumentPatch>() -> Value {
    serde_json::to_value(schemars::schema_for!(P)).unwrap_or(Value::Null)
}

// Fact sheet

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FactSheetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scam_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_hook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub red_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub the_fix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub officer_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_sources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ScamCategory>,
}

impl DocumentPatch for FactSheetPatch {
    fn is_empty(&self) -> bool {
        self == &FactSheetPatch::default()
    }
}

impl FactSheetPatch {
    /// Returns true when any field actually changed.
    pub fn apply(&self, sheet: &mut FactSheet) -> Result<bool, String> {
        for (name, value) in [
            ("scam_name", &self.scam_name),
            ("story_hook", &self.story_hook),
            ("red_flag", &self.red_flag),
            ("the_fix", &self.the_fix),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(format!("{} cannot be empty", name));
            }
        }

        let before = sheet.clone();
        replace(&mut sheet.scam_name, &self.scam_name);
        replace(&mut sheet.story_hook, &self.story_hook);
        replace(&mut sheet.red_flag, &self.red_flag);
        replace(&mut sheet.the_fix, &self.the_fix);
        replace(&mut sheet.reference_sources, &self.reference_sources);
        replace(&mut sheet.category, &self.category);
        if let Some(notes) = &self.officer_notes {
            sheet.officer_notes = Some(notes.clone()).filter(|n| !n.trim().is_empty());
        }
        Ok(*sheet != before)
    }
}

// Video package

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScenePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_overlay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_est_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<Transition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_music_mood: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct VideoPackagePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_script: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creative_notes: Option<String>,
    /// Keyed by 1-based scene id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scenes: BTreeMap<u32, ScenePatch>,
}

impl DocumentPatch for VideoPackagePatch {
    fn is_empty(&self) -> bool {
        self.master_script.is_none()
            && self.creative_notes.is_none()
            && self.scenes.values().all(|scene| scene == &ScenePatch::default())
    }
}

impl VideoPackagePatch {
    /// Visual and structural fields (prompt, duration, purpose, transition,
    /// music) are shared by every language variant and land in all of them.
    /// Narration and overlay text only change in `language_code`. Returns
    /// true when anything actually changed.
    pub fn apply(&self, package: &mut VideoPackage, language_code: &str) -> Result<bool, String> {
        let target = package
            .breakdowns
            .get(language_code)
            .ok_or_else(|| format!("no {} scene breakdown to edit", language_code))?;
        for (scene_id, scene) in &self.scenes {
            if !target.has_scene(*scene_id) {
                return Err(format!("scene {} does not exist", scene_id));
            }
            if let Some(secs) = scene.duration_est_seconds {
                validate_scene_duration(*scene_id, secs)?;
            }
        }

        let before = package.clone();
        replace(&mut package.master_script, &self.master_script);
        if let Some(notes) = &self.creative_notes {
            package.creative_notes = Some(notes.clone());
        }
        for (code, breakdown) in package.breakdowns.iter_mut() {
            let is_target = code == language_code;
            for (scene_id, patch) in &self.scenes {
                let Some(scene) = breakdown.scene_mut(*scene_id) else {
                    continue;
                };
                replace(&mut scene.visual_prompt, &patch.visual_prompt);
                replace(&mut scene.duration_est_seconds, &patch.duration_est_seconds);
                if patch.purpose.is_some() {
                    scene.purpose = patch.purpose.clone();
                }
                if patch.transition.is_some() {
                    scene.transition = patch.transition;
                }
                if patch.background_music_mood.is_some() {
                    scene.background_music_mood = patch.background_music_mood.clone();
                }
                if is_target {
                    replace(&mut scene.audio_script, &patch.audio_script);
                    if patch.text_overlay.is_some() {
                        scene.text_overlay = patch.text_overlay.clone();
                    }
                }
            }
        }
        Ok(*package != before)
    }
}

// Characters

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CharacterPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CharacterKind>,
    /// Redraw the image even when the description is unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regenerate_image: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CharactersPatch {
    /// Keyed by role name.
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterPatch>,
}

impl DocumentPatch for CharactersPatch {
    fn is_empty(&self) -> bool {
        self.characters.values().all(|c| c == &CharacterPatch::default())
    }
}

impl CharactersPatch {
    /// Returns the roles whose image must be redrawn, in roster order.
    pub fn apply(&self, roster: &mut CharacterRoster) -> Result<Vec<String>, String> {
        for (role, patch) in &self.characters {
            if !roster.contains(role) {
                return Err(format!("no character with role '{}'", role));
            }
            if patch.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
                return Err(format!("description for '{}' cannot be empty", role));
            }
        }

        let mut redraw = Vec::new();
        for character in roster.characters.iter_mut() {
            let Some(patch) = self.characters.get(&character.role) else {
                continue;
            };
            let mut changed = false;
            if let Some(description) = &patch.description {
                changed |= *description != character.description;
                character.description = description.clone();
            }
            if let Some(kind) = patch.kind {
                changed |= kind != character.kind;
                character.kind = kind;
            }
            if changed || patch.regenerate_image == Some(true) {
                redraw.push(character.role.clone());
            }
        }
        Ok(redraw)
    }
}

// Preview frames

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FramePromptPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct PreviewPatch {
    /// Keyed by scene id; values replace the frame prompts.
    #[serde(default)]
    pub frames: BTreeMap<u32, FramePromptPatch>,
}

impl DocumentPatch for PreviewPatch {
    fn is_empty(&self) -> bool {
        self.frames
            .values()
            .all(|f| f.start.is_none() && f.end.is_none())
    }
}

impl PreviewPatch {
    /// Flattens the patch into per-frame prompt changes after checking every
    /// addressed frame exists. Does not touch the preview itself.
    pub fn changes(&self, preview: &PreviewState) -> Result<Vec<PromptChange>, String> {
        let mut changes = Vec::new();
        for (scene_id, patch) in &self.frames {
            for (frame, prompt) in [(FrameRole::Start, &patch.start), (FrameRole::End, &patch.end)] {
                let Some(prompt) = prompt else { continue };
                if prompt.trim().is_empty() {
                    return Err(format!("scene {} {:?} prompt cannot be empty", scene_id, frame));
                }
                let key = FrameKey {
                    scene_id: *scene_id,
                    frame,
                };
                if !preview.has_frame(key) {
                    return Err(format!("scene {} has no {:?} frame", scene_id, frame));
                }
                changes.push(PromptChange {
                    scene_id: *scene_id,
                    frame,
                    prompt: prompt.clone(),
                });
            }
        }
        Ok(changes)
    }
}

// Social package

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CaptionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_engagement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct HashtagsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_hashtags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trending_hashtags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche_hashtags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branded_hashtags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SocialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_analysis: Option<TrendAnalysis>,
    /// Keyed by 0-based caption index.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub captions: BTreeMap<usize, CaptionPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_caption_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ThumbnailRecommendation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<HashtagsPatch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_notes: Option<String>,
}

impl DocumentPatch for SocialPatch {
    fn is_empty(&self) -> bool {
        self == &SocialPatch::default()
    }
}

impl SocialPatch {
    fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.trend_analysis.is_some() {
            fields.push("trend_analysis");
        }
        if !self.captions.is_empty() {
            fields.push("captions");
        }
        if self.selected_caption_index.is_some() {
            fields.push("selected_caption_index");
        }
        if self.thumbnail.is_some() {
            fields.push("thumbnail");
        }
        if self.hashtags.is_some() {
            fields.push("hashtags");
        }
        if self.posting_notes.is_some() {
            fields.push("posting_notes");
        }
        fields
    }

    /// Rejects fields that fall outside the section being edited.
    pub fn check_section(&self, section: SocialSection) -> Result<(), String> {
        let allowed: &[&str] = match section {
            SocialSection::Trends => &["trend_analysis"],
            SocialSection::Captions => &["captions", "selected_caption_index"],
            SocialSection::Thumbnail => &["thumbnail"],
            SocialSection::Hashtags => &["hashtags"],
            SocialSection::All => return Ok(()),
        };
        match self.touched_fields().into_iter().find(|f| !allowed.contains(f)) {
            Some(field) => Err(format!("{} is outside the {} section", field, section)),
            None => Ok(()),
        }
    }

    pub fn apply(&self, package: &mut SocialPackage) -> Result<(), String> {
        for index in self.captions.keys() {
            if *index >= package.captions.len() {
                return Err(format!("caption {} does not exist", index));
            }
        }
        if let Some(index) = self.selected_caption_index {
            if index >= package.captions.len() {
                return Err(format!("selected_caption_index {} is out of range", index));
            }
        }

        replace(&mut package.trend_analysis, &self.trend_analysis);
        for (index, patch) in &self.captions {
            let caption: &mut CaptionOption = &mut package.captions[*index];
            replace(&mut caption.caption, &patch.caption);
            replace(&mut caption.style, &patch.style);
            replace(&mut caption.estimated_engagement, &patch.estimated_engagement);
            replace(&mut caption.call_to_action, &patch.call_to_action);
        }
        replace(&mut package.selected_caption_index, &self.selected_caption_index);
        replace(&mut package.thumbnail, &self.thumbnail);
        if let Some(tags) = &self.hashtags {
            let strategy = &mut package.hashtags;
            replace(&mut strategy.primary_hashtags, &tags.primary_hashtags);
            replace(&mut strategy.trending_hashtags, &tags.trending_hashtags);
            replace(&mut strategy.niche_hashtags, &tags.niche_hashtags);
            replace(&mut strategy.branded_hashtags, &tags.branded_hashtags);
        }
        if let Some(notes) = &self.posting_notes {
            package.posting_notes = Some(notes.clone());
        }
        package.normalize();
        Ok(())
    }
}

fn replace<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

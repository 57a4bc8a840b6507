use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    catalog::{Language, Transition, MAX_SCENE_DURATION_SECS, MIN_SCENE_DURATION_SECS},
    characters::Character,
};

/// One clip of the video. `scene_id` is 1-based and stable across languages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_id: u32,
    pub duration_est_seconds: u32,
    pub visual_prompt: String,
    pub audio_script: String,
    /// Narrative role of the scene, e.g. "HOOK" or "CALL TO ACTION".
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub text_overlay: Option<String>,
    #[serde(default)]
    pub transition: Option<Transition>,
    #[serde(default)]
    pub background_music_mood: Option<String>,
}

/// The scene list for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneBreakdown {
    pub project_id: String,
    pub language: Language,
    pub scenes: Vec<Scene>,
}

impl SceneBreakdown {
    pub fn total_duration_secs(&self) -> u32 {
        self.scenes.iter().map(|scene| scene.duration_est_seconds).sum()
    }

    pub fn scene_mut(&mut self, scene_id: u32) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|scene| scene.scene_id == scene_id)
    }

    pub fn has_scene(&self, scene_id: u32) -> bool {
        self.scenes.iter().any(|scene| scene.scene_id == scene_id)
    }
}

/// Scene breakdowns for every requested language, keyed by language code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoPackage {
    pub master_script: String,
    #[serde(default)]
    pub creative_notes: Option<String>,
    pub target_duration_secs: u32,
    pub breakdowns: BTreeMap<String, SceneBreakdown>,
}

impl VideoPackage {
    pub fn breakdown(&self, language_code: &str) -> Option<&SceneBreakdown> {
        self.breakdowns.get(language_code)
    }

    pub fn has_content_for_any(&self, languages: &[Language]) -> bool {
        languages.iter().any(|lang| {
            self.breakdowns
                .get(lang.code())
                .map(|breakdown| !breakdown.scenes.is_empty())
                .unwrap_or(false)
        })
    }

    /// Advisory check that scene durations roughly add up to the target.
    pub fn duration_warnings(&self) -> Vec<String> {
        let target = self.target_duration_secs;
        let tolerance = (target / 4).max(MAX_SCENE_DURATION_SECS);
        self.breakdowns
            .iter()
            .filter_map(|(code, breakdown)| {
                let total = breakdown.total_duration_secs();
                (total.abs_diff(target) > tolerance).then(|| {
                    format!(
                        "{} version runs {}s against a {}s target",
                        code, total, target
                    )
                })
            })
            .collect()
    }
}

/// Director collaborator output before localisation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptDraft {
    pub master_script: String,
    #[serde(default)]
    pub creative_notes: Option<String>,
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub characters: Vec<Character>,
}

/// Checks ids are 1..=n in order and every duration fits a single clip.
pub fn validate_scenes(scenes: &[Scene]) -> Result<(), String> {
    if scenes.is_empty() {
        return Err("script contains no scenes".to_string());
    }
    for (index, scene) in scenes.iter().enumerate() {
        let expected = index as u32 + 1;
        if scene.scene_id != expected {
            return Err(format!(
                "scene ids must be sequential from 1, found {} at position {}",
                scene.scene_id, expected
            ));
        }
        validate_scene_duration(scene.scene_id, scene.duration_est_seconds)?;
    }
    Ok(())
}

pub fn validate_scene_duration(scene_id: u32, secs: u32) -> Result<(), String> {
    if !(MIN_SCENE_DURATION_SECS..=MAX_SCENE_DURATION_SECS).contains(&secs) {
        return Err(format!(
            "scene {} duration {}s is outside {}..={}s",
            scene_id, secs, MIN_SCENE_DURATION_SECS, MAX_SCENE_DURATION_SECS
        ));
    }
    Ok(())
}

/// A translation must keep the scene count and ids of the source.
pub fn validate_translation(source: &[Scene], translated: &[Scene]) -> Result<(), String> {
    if source.len() != translated.len() {
        return Err(format!(
            "translation has {} scenes, script has {}",
            translated.len(),
            source.len()
        ));
    }
    for (a, b) in source.iter().zip(translated) {
        if a.scene_id != b.scene_id {
            return Err(format!(
                "translation scene id {} does not match script scene id {}",
                b.scene_id, a.scene_id
            ));
        }
    }
    Ok(())
}

#[cfg(any(test, feature = "test-support"))]
pub(crate) fn sample_scenes(count: u32) -> Vec<Scene> {
    (1..=count)
        .map(|id| Scene {
            scene_id: id,
            duration_est_seconds: 7,
            visual_prompt: format!("Scene {} visual", id),
            audio_script: format!("Scene {} narration", id),
            purpose: Some(if id == 1 { "HOOK" } else { "STORY" }.to_string()),
            text_overlay: Some(format!("Overlay {}", id)),
            transition: Some(Transition::Cut),
            background_music_mood: Some("tense".to_string()),
        })
        .collect()
}

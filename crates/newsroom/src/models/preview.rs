use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::ImageRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameRole {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameKey {
    pub scene_id: u32,
    pub frame: FrameRole,
}

/// A still for the start or end of one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewFrame {
    pub scene_id: u32,
    pub frame: FrameRole,
    pub visual_prompt: String,
    pub image: ImageRef,
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub refined_at: Option<DateTime<Utc>>,
}

impl PreviewFrame {
    pub fn key(&self) -> FrameKey {
        FrameKey {
            scene_id: self.scene_id,
            frame: self.frame,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptChange {
    pub scene_id: u32,
    pub frame: FrameRole,
    pub prompt: String,
}

/// One chat turn that changed the preview. Entries are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementEntry {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub reply: String,
    pub updated_prompts: Vec<PromptChange>,
    pub regenerated_frames: Vec<FrameKey>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewState {
    #[serde(default)]
    pub language_code: Option<String>,
    pub frames: Vec<PreviewFrame>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    refinement_history: Vec<RefinementEntry>,
}

impl PreviewState {
    pub fn new(language_code: &str, frames: Vec<PreviewFrame>) -> Self {
        Self {
            language_code: Some(language_code.to_string()),
            frames,
            generated_at: Some(Utc::now()),
            refinement_history: Vec::new(),
        }
    }

    /// Swaps in a fresh set of frames; the refinement log survives.
    pub fn replace_frames(&mut self, language_code: &str, frames: Vec<PreviewFrame>) {
        self.language_code = Some(language_code.to_string());
        self.frames = frames;
        self.generated_at = Some(Utc::now());
    }

    pub fn frame_mut(&mut self, key: FrameKey) -> Option<&mut PreviewFrame> {
        self.frames.iter_mut().find(|frame| frame.key() == key)
    }

    pub fn has_frame(&self, key: FrameKey) -> bool {
        self.frames.iter().any(|frame| frame.key() == key)
    }

    pub fn record_refinement(&mut self, entry: RefinementEntry) {
        self.refinement_history.push(entry);
    }

    pub fn refinement_history(&self) -> &[RefinementEntry] {
        &self.refinement_history
    }
}

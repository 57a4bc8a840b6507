use serde::{Deserialize, Serialize};

use super::catalog::{
    find_avatar, Avatar, Language, TargetAudience, Tone, VideoFormat, MIN_VIDEO_DURATION_SECS,
};

/// Creator studio selections as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub target_groups: Vec<TargetAudience>,
    pub languages: Vec<Language>,
    pub tone: Tone,
    pub avatar_id: String,
    #[serde(default)]
    pub video_format: VideoFormat,
    #[serde(default)]
    pub video_duration_seconds: Option<u32>,
    #[serde(default)]
    pub director_instructions: Option<String>,
}

/// Validated configuration for one generation run. Replaced wholesale on regeneration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub target_groups: Vec<TargetAudience>,
    pub languages: Vec<Language>,
    pub tone: Tone,
    pub avatar: Avatar,
    pub video_format: VideoFormat,
    pub video_duration_seconds: Option<u32>,
    pub director_instructions: Option<String>,
}

impl GenerationConfig {
    /// Validates a request. Duplicate audiences and languages are collapsed, order kept.
    pub fn from_request(request: GenerationRequest) -> Result<Self, String> {
        let target_groups = dedup(request.target_groups);
        if target_groups.is_empty() {
            return Err("at least one target audience is required".to_string());
        }
        let languages = dedup(request.languages);
        if languages.is_empty() {
            return Err("at least one language is required".to_string());
        }
        let avatar = find_avatar(&request.avatar_id)
            .ok_or_else(|| format!("unknown avatar_id: {}", request.avatar_id))?;
        if let Some(secs) = request.video_duration_seconds {
            if secs < MIN_VIDEO_DURATION_SECS {
                return Err(format!(
                    "video_duration_seconds must be at least {}",
                    MIN_VIDEO_DURATION_SECS
                ));
            }
        }

        Ok(Self {
            target_groups,
            languages,
            tone: request.tone,
            avatar,
            video_format: request.video_format,
            video_duration_seconds: request.video_duration_seconds,
            director_instructions: request
                .director_instructions
                .filter(|text| !text.trim().is_empty()),
        })
    }

    /// Target total duration, clamped to the format ceiling.
    pub fn target_duration_secs(&self) -> u32 {
        let max = self.video_format.max_duration_secs();
        match self.video_duration_seconds {
            Some(secs) => secs.min(max),
            None => self.video_format.default_duration_secs(),
        }
    }

    pub fn primary_language(&self) -> Language {
        self.languages[0]
    }

    pub fn language_codes(&self) -> Vec<&'static str> {
        self.languages.iter().map(Language::code).collect()
    }
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(any(test, feature = "test-support"))]
pub(crate) fn sample_request() -> GenerationRequest {
    GenerationRequest {
        target_groups: vec![TargetAudience::Elderly],
        languages: vec![Language::English, Language::Malay],
        tone: Tone::Urgent,
        avatar_id: "officer_malay_male_01".to_string(),
        video_format: VideoFormat::Reel,
        video_duration_seconds: None,
        director_instructions: None,
    }
}

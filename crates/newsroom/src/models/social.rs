use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::catalog::SocialPlatform;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrendAnalysis {
    #[serde(default)]
    pub trending_topics: Vec<String>,
    #[serde(default)]
    pub recommended_posting_time: String,
    #[serde(default)]
    pub content_angle: String,
    #[serde(default)]
    pub viral_potential: String,
    #[serde(default)]
    pub trend_hooks: Vec<String>,
    #[serde(default)]
    pub competitor_insights: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionOption {
    pub caption: String,
    pub style: String,
    #[serde(default)]
    pub estimated_engagement: String,
    #[serde(default)]
    pub call_to_action: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThumbnailRecommendation {
    #[serde(default)]
    pub recommended_scene_id: Option<u32>,
    pub thumbnail_prompt: String,
    #[serde(default)]
    pub text_overlay: Option<String>,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub style_notes: Option<String>,
}

/// Four tagged hashtag groups plus the derived combined string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HashtagStrategy {
    #[serde(default)]
    pub primary_hashtags: Vec<String>,
    #[serde(default)]
    pub trending_hashtags: Vec<String>,
    #[serde(default)]
    pub niche_hashtags: Vec<String>,
    #[serde(default)]
    pub branded_hashtags: Vec<String>,
    #[serde(default)]
    pub total_count: usize,
    #[serde(default)]
    pub hashtag_string: String,
}

impl HashtagStrategy {
    /// Rebuilds `hashtag_string` and `total_count` from the groups, skipping repeats.
    pub fn recompute(&mut self) {
        let mut seen: Vec<String> = Vec::new();
        for tag in self
            .primary_hashtags
            .iter()
            .chain(&self.trending_hashtags)
            .chain(&self.niche_hashtags)
            .chain(&self.branded_hashtags)
        {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            let tag = if tag.starts_with('#') {
                tag.to_string()
            } else {
                format!("#{}", tag)
            };
            if !seen.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                seen.push(tag);
            }
        }
        self.total_count = seen.len();
        self.hashtag_string = seen.join(" ");
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPackage {
    pub platform: SocialPlatform,
    pub trend_analysis: TrendAnalysis,
    pub captions: Vec<CaptionOption>,
    #[serde(default)]
    pub selected_caption_index: usize,
    pub thumbnail: ThumbnailRecommendation,
    pub hashtags: HashtagStrategy,
    #[serde(default)]
    pub posting_notes: Option<String>,
}

impl SocialPackage {
    /// Clamps the selection into range and refreshes derived hashtag fields.
    pub fn normalize(&mut self) {
        if self.selected_caption_index >= self.captions.len() {
            self.selected_caption_index = 0;
        }
        self.hashtags.recompute();
    }

    pub fn selected_caption(&self) -> Option<&CaptionOption> {
        self.captions.get(self.selected_caption_index)
    }
}

/// Part of the social package a chat turn is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialSection {
    Trends,
    Captions,
    Thumbnail,
    Hashtags,
    #[default]
    All,
}

impl fmt::Display for SocialSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SocialSection::Trends => "trends",
            SocialSection::Captions => "captions",
            SocialSection::Thumbnail => "thumbnail",
            SocialSection::Hashtags => "hashtags",
            SocialSection::All => "all",
        };
        f.write_str(name)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub(crate) fn sample_social_package() -> SocialPackage {
    let mut package = SocialPackage {
        platform: SocialPlatform::Instagram,
        trend_analysis: TrendAnalysis {
            trending_topics: vec!["wedding season".to_string()],
            recommended_posting_time: "Friday 8pm".to_string(),
            content_angle: "Protect your parents".to_string(),
            viral_potential: "high".to_string(),
            trend_hooks: vec![],
            competitor_insights: None,
        },
        captions: vec![
            CaptionOption {
                caption: "Never install a wedding card.".to_string(),
                style: "urgent".to_string(),
                estimated_engagement: "high".to_string(),
                call_to_action: "Share with family".to_string(),
            },
            CaptionOption {
                caption: "A card should not need an installer.".to_string(),
                style: "calm".to_string(),
                estimated_engagement: "medium".to_string(),
                call_to_action: "Call 997".to_string(),
            },
        ],
        selected_caption_index: 0,
        thumbnail: ThumbnailRecommendation {
            recommended_scene_id: Some(1),
            thumbnail_prompt: "Phone showing APK file".to_string(),
            text_overlay: Some("DON'T TAP".to_string()),
            rationale: "Clear threat".to_string(),
            style_notes: None,
        },
        hashtags: HashtagStrategy {
            primary_hashtags: vec!["#ScamAlert".to_string()],
            trending_hashtags: vec!["WeddingSeason".to_string()],
            niche_hashtags: vec![],
            branded_hashtags: vec!["#PDRM".to_string(), "#scamalert".to_string()],
            total_count: 0,
            hashtag_string: String::new(),
        },
        posting_notes: None,
    };
    package.normalize();
    package
}

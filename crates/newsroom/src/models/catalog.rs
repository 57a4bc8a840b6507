//! Closed enumerations and fixed constraints shared by every stage of the pipeline.

use std::{fmt, str::FromStr};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Longest clip the renderer accepts for a single scene, independent of format.
pub const MAX_SCENE_DURATION_SECS: u32 = 8;
pub const MIN_SCENE_DURATION_SECS: u32 = 1;

/// Shortest total duration a caller may request.
pub const MIN_VIDEO_DURATION_SECS: u32 = 8;

pub const DEFAULT_STANDARDS: [&str; 3] = ["MCMC Guidelines", "Sedition Act 1948", "3R Policy"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum TargetAudience {
    Elderly,
    Students,
    Professionals,
    #[serde(rename = "Online Shoppers")]
    OnlineShoppers,
    #[serde(rename = "General Public")]
    GeneralPublic,
}

impl TargetAudience {
    pub const ALL: [TargetAudience; 5] = [
        TargetAudience::Elderly,
        TargetAudience::Students,
        TargetAudience::Professionals,
        TargetAudience::OnlineShoppers,
        TargetAudience::GeneralPublic,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TargetAudience::Elderly => "Elderly",
            TargetAudience::Students => "Students",
            TargetAudience::Professionals => "Professionals",
            TargetAudience::OnlineShoppers => "Online Shoppers",
            TargetAudience::GeneralPublic => "General Public",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Language {
    #[serde(rename = "Bahasa Melayu")]
    Malay,
    #[serde(rename = "Bahasa Melayu (Urban)")]
    MalayUrban,
    English,
    #[serde(rename = "Chinese (Mandarin)")]
    Mandarin,
    #[serde(rename = "Chinese (Cantonese)")]
    Cantonese,
    Tamil,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Malay,
        Language::MalayUrban,
        Language::English,
        Language::Mandarin,
        Language::Cantonese,
        Language::Tamil,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Language::Malay => "Bahasa Melayu",
            Language::MalayUrban => "Bahasa Melayu (Urban)",
            Language::English => "English",
            Language::Mandarin => "Chinese (Mandarin)",
            Language::Cantonese => "Chinese (Cantonese)",
            Language::Tamil => "Tamil",
        }
    }

    /// Short key used for per-language documents and render project ids.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Malay => "bm",
            Language::MalayUrban => "bm_urban",
            Language::English => "en",
            Language::Mandarin => "zh",
            Language::Cantonese => "zh_yue",
            Language::Tamil => "ta",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        Language::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Tone {
    #[serde(rename = "Urgent/Warning")]
    Urgent,
    Calm,
    Friendly,
    Authoritative,
    #[serde(rename = "High Energy")]
    HighEnergy,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Tone::Urgent,
        Tone::Calm,
        Tone::Friendly,
        Tone::Authoritative,
        Tone::HighEnergy,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Urgent => "Urgent/Warning",
            Tone::Calm => "Calm",
            Tone::Friendly => "Friendly",
            Tone::Authoritative => "Authoritative",
            Tone::HighEnergy => "High Energy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    NewsUrl,
    PoliceReport,
    ManualDescription,
    TrendingNewsroom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ScamCategory {
    #[serde(rename = "Digital Arrest")]
    DigitalArrest,
    Impersonation,
    Phishing,
    #[serde(rename = "Banking Fraud")]
    BankingFraud,
    #[serde(rename = "Love Scam")]
    LoveScam,
    #[serde(rename = "Investment Scam")]
    InvestmentScam,
    #[serde(rename = "Parcel/Delivery Scam")]
    ParcelScam,
    #[serde(rename = "Job Scam")]
    JobScam,
    #[serde(rename = "E-Commerce Scam")]
    ECommerce,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    Reel,
    Story,
    Post,
}

impl Default for VideoFormat {
    fn default() -> Self {
        VideoFormat::Reel
    }
}

impl VideoFormat {
    pub const ALL: [VideoFormat; 3] = [VideoFormat::Reel, VideoFormat::Story, VideoFormat::Post];

    pub fn max_duration_secs(&self) -> u32 {
        match self {
            VideoFormat::Reel => 30,
            VideoFormat::Story => 15,
            VideoFormat::Post => 60,
        }
    }

    /// Every format defaults to its own ceiling.
    pub fn default_duration_secs(&self) -> u32 {
        self.max_duration_secs()
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoFormat::Reel => write!(f, "reel"),
            VideoFormat::Story => write!(f, "story"),
            VideoFormat::Post => write!(f, "post"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Cut,
    Fade,
    Swipe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Instagram,
    Tiktok,
    Facebook,
    X,
}

impl Default for SocialPlatform {
    fn default() -> Self {
        SocialPlatform::Instagram
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocialPlatform::Instagram => write!(f, "instagram"),
            SocialPlatform::Tiktok => write!(f, "tiktok"),
            SocialPlatform::Facebook => write!(f, "facebook"),
            SocialPlatform::X => write!(f, "x"),
        }
    }
}

impl FromStr for SocialPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instagram" => Ok(SocialPlatform::Instagram),
            "tiktok" => Ok(SocialPlatform::Tiktok),
            "facebook" => Ok(SocialPlatform::Facebook),
            "x" | "twitter" => Ok(SocialPlatform::X),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ethnicity {
    Malay,
    Chinese,
    Indian,
    Mixed,
}

/// A presenter avatar the officers have approved for public videos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub id: String,
    pub name: String,
    pub rank: Option<String>,
    pub gender: Gender,
    pub ethnicity: Ethnicity,
}

impl Avatar {
    fn officer(id: &str, name: &str, gender: Gender, ethnicity: Ethnicity) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            rank: Some("Inspektor".to_string()),
            gender,
            ethnicity,
        }
    }
}

pub fn trusted_avatars() -> Vec<Avatar> {
    vec![
        Avatar::officer("officer_malay_male_01", "Inspektor Amir", Gender::Male, Ethnicity::Malay),
        Avatar::officer("officer_malay_female_01", "Inspektor Siti", Gender::Female, Ethnicity::Malay),
        Avatar::officer("officer_chinese_male_01", "Inspektor Wong", Gender::Male, Ethnicity::Chinese),
        Avatar::officer(
            "officer_chinese_female_01",
            "Inspektor Mei Lin",
            Gender::Female,
            Ethnicity::Chinese,
        ),
        Avatar::officer("officer_indian_male_01", "Inspektor Rajan", Gender::Male, Ethnicity::Indian),
        Avatar::officer("officer_indian_female_01", "Inspektor Priya", Gender::Female, Ethnicity::Indian),
    ]
}

pub fn find_avatar(id: &str) -> Option<Avatar> {
    trusted_avatars().into_iter().find(|avatar| avatar.id == id)
}

/// Presenters offered when no recommendation can be made.
pub const DEFAULT_AVATAR_IDS: [&str; 2] = ["officer_malay_male_01", "officer_malay_female_01"];

/// Keeps the trusted ids in the order given, without repeats.
pub fn keep_trusted_avatars(ids: &[String]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if find_avatar(id).is_some() && !kept.iter().any(|k| k == id) {
            kept.push(id.to_string());
        }
    }
    kept
}

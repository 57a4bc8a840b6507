use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::catalog::{ScamCategory, SourceType};

/// Raw material submitted by an officer at intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeInput {
    pub source_type: SourceType,
    pub content: String,
    #[serde(default)]
    pub additional_context: Option<String>,
    #[serde(default)]
    pub officer_id: Option<String>,
    /// Per-request override of the deep research setting.
    #[serde(default)]
    pub use_deep_research: Option<bool>,
}

/// Verifiable claims about one scam.
///
/// `verification_timestamp` is set exactly when `verified_by_officer` is true;
/// both only change through [`FactSheet::verify`] and [`FactSheet::revoke_verification`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactSheet {
    pub scam_name: String,
    pub story_hook: String,
    pub red_flag: String,
    pub the_fix: String,
    #[serde(default)]
    pub reference_sources: Vec<String>,
    pub category: ScamCategory,
    #[serde(default)]
    pub verified_by_officer: bool,
    #[serde(default)]
    pub verification_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verified_by: Option<String>,
    #[serde(default)]
    pub officer_notes: Option<String>,
    // Deep research insights
    #[serde(default)]
    pub global_ancestry: Option<String>,
    #[serde(default)]
    pub psychological_exploit: Option<String>,
    #[serde(default)]
    pub victim_profile: Option<String>,
    #[serde(default)]
    pub counter_hack: Option<String>,
}

impl FactSheet {
    pub fn verify(&mut self, officer_id: &str) {
        self.verified_by_officer = true;
        self.verification_timestamp = Some(Utc::now());
        self.verified_by = Some(officer_id.to_string());
    }

    pub fn revoke_verification(&mut self) {
        self.verified_by_officer = false;
        self.verification_timestamp = None;
        self.verified_by = None;
    }

    pub fn is_verified(&self) -> bool {
        self.verified_by_officer && self.verification_timestamp.is_some()
    }
}

#[cfg(any(test, feature = "test-support"))]
pub(crate) fn sample_fact_sheet() -> FactSheet {
    FactSheet {
        scam_name: "Wedding Invitation APK Scam".to_string(),
        story_hook: "A digital wedding card arrives on WhatsApp as an APK file.".to_string(),
        red_flag: "Invitations never arrive as .apk installers.".to_string(),
        the_fix: "Delete the file and call 997 if money was lost.".to_string(),
        reference_sources: vec!["https://semakmule.rmp.gov.my".to_string()],
        category: ScamCategory::Phishing,
        verified_by_officer: false,
        verification_timestamp: None,
        verified_by: None,
        officer_notes: None,
        global_ancestry: None,
        psychological_exploit: None,
        victim_profile: None,
        counter_hack: None,
    }
}

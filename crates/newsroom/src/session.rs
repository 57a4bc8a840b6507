use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    CharacterRoster, ComplianceReport, FactSheet, GenerationConfig, PreviewState, RenderJob,
    SocialPackage, VideoPackage,
};

/// Opaque session token handed out at intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Ordered wizard stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Briefing,
    Configuration,
    Script,
    Characters,
    Preview,
    Render,
    Compliance,
    Publish,
}

impl WorkflowStage {
    pub const ALL: [WorkflowStage; 8] = [
        WorkflowStage::Briefing,
        WorkflowStage::Configuration,
        WorkflowStage::Script,
        WorkflowStage::Characters,
        WorkflowStage::Preview,
        WorkflowStage::Render,
        WorkflowStage::Compliance,
        WorkflowStage::Publish,
    ];

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Stages whose exit gate is crossed when moving from `self` to `to`.
    pub fn exits_towards(self, to: WorkflowStage) -> impl Iterator<Item = WorkflowStage> {
        let (from, to) = (self.index(), to.index());
        Self::ALL
            .into_iter()
            .filter(move |stage| stage.index() >= from && stage.index() < to)
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowStage::Briefing => "briefing",
            WorkflowStage::Configuration => "configuration",
            WorkflowStage::Script => "script",
            WorkflowStage::Characters => "characters",
            WorkflowStage::Preview => "preview",
            WorkflowStage::Render => "render",
            WorkflowStage::Compliance => "compliance",
            WorkflowStage::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Root aggregate for one end-to-end run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub stage: WorkflowStage,
    pub fact_sheet: FactSheet,
    pub config: Option<GenerationConfig>,
    pub video_package: Option<VideoPackage>,
    pub roster: CharacterRoster,
    pub preview: PreviewState,
    pub render_jobs: BTreeMap<String, RenderJob>,
    pub compliance: Option<ComplianceReport>,
    /// Set when produced content changed after the last compliance run.
    pub compliance_stale: bool,
    pub social: Option<SocialPackage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, fact_sheet: FactSheet) -> Self {
        let now = Utc::now();
        Self {
            id,
            stage: WorkflowStage::Briefing,
            fact_sheet,
            config: None,
            video_package: None,
            roster: CharacterRoster::default(),
            preview: PreviewState::default(),
            render_jobs: BTreeMap::new(),
            compliance: None,
            compliance_stale: false,
            social: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Project id the renderer uses for one language of this session.
    pub fn project_id(&self, language_code: &str) -> String {
        format!("{}_{}", self.id, language_code)
    }

    pub fn invalidate_compliance(&mut self) {
        if self.compliance.is_some() {
            self.compliance_stale = true;
        }
    }

    /// True when a report exists and nothing changed since it ran.
    pub fn compliance_current(&self) -> bool {
        self.compliance.is_some() && !self.compliance_stale
    }

    pub fn has_video_content(&self) -> bool {
        match (&self.video_package, &self.config) {
            (Some(package), Some(config)) => package.has_content_for_any(&config.languages),
            _ => false,
        }
    }
}

/// Lightweight listing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: SessionId,
    pub scam_name: String,
    pub stage: WorkflowStage,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            scam_name: session.fact_sheet.scam_name.clone(),
            stage: session.stage,
            verified: session.fact_sheet.is_verified(),
            created_at: session.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fact_sheet::sample_fact_sheet;

    #[test]
    fn exits_between_stages() {
        let crossed: Vec<_> = WorkflowStage::Briefing
            .exits_towards(WorkflowStage::Script)
            .collect();
        assert_eq!(crossed, vec![WorkflowStage::Briefing, WorkflowStage::Configuration]);
        assert_eq!(
            WorkflowStage::Script.exits_towards(WorkflowStage::Briefing).count(),
            0
        );
    }

    #[test]
    fn session_id_round_trips_through_text() {
        let id = SessionId::new();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert!("not-a-uuid".parse::<SessionId>().is_err());
    }

    #[test]
    fn compliance_is_only_stale_once_a_report_exists() {
        let mut session = Session::new(SessionId::new(), sample_fact_sheet());
        session.invalidate_compliance();
        assert!(!session.compliance_stale);
        assert!(session.project_id("en").ends_with("_en"));
    }
}

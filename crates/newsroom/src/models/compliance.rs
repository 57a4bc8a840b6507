use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFlag {
    pub severity: Severity,
    pub issue_type: String,
    pub description: String,
    #[serde(default)]
    pub scene_id: Option<u32>,
    #[serde(default)]
    pub suggested_fix: Option<String>,
    #[serde(default)]
    pub regulation_reference: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Passed,
    Warning,
    Flagged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    pub category: String,
    pub status: AnalysisStatus,
    pub analysis: String,
    #[serde(default)]
    pub elements_reviewed: Vec<String>,
}

/// Result of one compliance run. Replaced wholesale by the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceReport {
    pub passed: bool,
    #[serde(default)]
    pub flags: Vec<ComplianceFlag>,
    #[serde(default)]
    pub detailed_analysis: Vec<CategoryAnalysis>,
    #[serde(default)]
    pub compliance_summary: String,
    #[serde(default)]
    pub checked_against: Vec<String>,
}

impl ComplianceReport {
    pub fn critical_flags(&self) -> impl Iterator<Item = &ComplianceFlag> {
        self.flags
            .iter()
            .filter(|flag| flag.severity == Severity::Critical)
    }

    /// Report used when the sensitivity check is switched off by configuration.
    pub fn skipped(standards: &[String]) -> Self {
        Self {
            passed: true,
            flags: Vec::new(),
            detailed_analysis: Vec::new(),
            compliance_summary: "Sensitivity check skipped by configuration".to_string(),
            checked_against: standards.to_vec(),
        }
    }
}

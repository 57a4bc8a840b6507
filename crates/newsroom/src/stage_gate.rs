use serde::{Deserialize, Serialize};

use crate::session::{Session, WorkflowStage};

pub const REASON_NOT_VERIFIED: &str = "fact sheet not verified";
pub const REASON_NO_PACKAGE: &str = "no video package generated";
pub const REASON_COMPLIANCE_PENDING: &str = "compliance review pending";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Allow { warnings: Vec<String> },
    Deny { reason: String },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow { .. })
    }
}

/// Decides whether `session` may move from `from` to `to`.
///
/// Evaluated against the live session on every call; every exit gate between
/// the two stages must pass. Moving backwards or staying put is always allowed.
pub fn can_advance(session: &Session, from: WorkflowStage, to: WorkflowStage) -> GateDecision {
    let mut warnings = Vec::new();
    for stage in from.exits_towards(to) {
        match exit_check(session, stage) {
            Exit::Open => {}
            Exit::Warn(message) => warnings.push(message),
            Exit::Closed(reason) => {
                return GateDecision::Deny {
                    reason: reason.to_string(),
                }
            }
        }
    }
    GateDecision::Allow { warnings }
}

enum Exit {
    Open,
    Warn(String),
    Closed(&'static str),
}

fn exit_check(session: &Session, stage: WorkflowStage) -> Exit {
    match stage {
        WorkflowStage::Briefing if !session.fact_sheet.is_verified() => {
            Exit::Closed(REASON_NOT_VERIFIED)
        }
        WorkflowStage::Script if !session.has_video_content() => Exit::Closed(REASON_NO_PACKAGE),
        WorkflowStage::Compliance => match &session.compliance {
            None => Exit::Closed(REASON_COMPLIANCE_PENDING),
            Some(_) if session.compliance_stale => Exit::Closed(REASON_COMPLIANCE_PENDING),
            Some(report) if !report.passed => Exit::Warn(format!(
                "compliance review failed with {} flag(s); publishing requires officer override",
                report.flags.len()
            )),
            Some(_) => Exit::Open,
        },
        _ => Exit::Open,
    }
}

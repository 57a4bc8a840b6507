use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::RenderedOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    Queued,
    Rendering,
    Completed,
    Failed,
}

impl RenderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderStatus::Completed | RenderStatus::Failed)
    }

    /// Status only moves forward: queued -> rendering -> completed | failed.
    pub fn can_transition(&self, next: RenderStatus) -> bool {
        use RenderStatus::*;
        matches!(
            (self, next),
            (Queued, Rendering) | (Rendering, Completed) | (Rendering, Failed)
        )
    }
}

/// What the rendering collaborator reports when it is done with a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RenderOutcome {
    Completed { output: RenderedOutput },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderJob {
    pub project_id: String,
    pub job_id: String,
    pub language_code: String,
    pub status: RenderStatus,
    pub scene_count: u32,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub output: Option<RenderedOutput>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl RenderJob {
    pub fn queued(project_id: String, job_id: String, language_code: String, scene_count: u32) -> Self {
        Self {
            project_id,
            job_id,
            language_code,
            status: RenderStatus::Queued,
            scene_count,
            requested_at: Utc::now(),
            started_at: None,
            finished_at: None,
            output: None,
            failure_reason: None,
        }
    }

    /// Moves the job forward. Returns false and leaves the job untouched on a backward move.
    pub fn advance(&mut self, next: RenderStatus) -> bool {
        if !self.status.can_transition(next) {
            return false;
        }
        self.status = next;
        match next {
            RenderStatus::Rendering => self.started_at = Some(Utc::now()),
            RenderStatus::Completed | RenderStatus::Failed => self.finished_at = Some(Utc::now()),
            RenderStatus::Queued => {}
        }
        true
    }

    /// Applies a terminal outcome, passing through `rendering` if the job was still queued.
    pub fn finish(&mut self, outcome: RenderOutcome) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        if self.status == RenderStatus::Queued {
            self.advance(RenderStatus::Rendering);
        }
        match outcome {
            RenderOutcome::Completed { output } => {
                self.output = Some(output);
                self.advance(RenderStatus::Completed)
            }
            RenderOutcome::Failed { reason } => {
                self.failure_reason = Some(reason);
                self.advance(RenderStatus::Failed)
            }
        }
    }

    /// True when `outcome` is what this terminal job already recorded.
    pub fn matches_outcome(&self, outcome: &RenderOutcome) -> bool {
        match (self.status, outcome) {
            (RenderStatus::Completed, RenderOutcome::Completed { output }) => {
                self.output.as_ref() == Some(output)
            }
            (RenderStatus::Failed, RenderOutcome::Failed { reason }) => {
                self.failure_reason.as_deref() == Some(reason.as_str())
            }
            _ => false,
        }
    }

    /// Progress estimate from elapsed wall time. Never reports 100 before completion.
    pub fn progress_percent(&self, seconds_per_scene: u64, now: DateTime<Utc>) -> u8 {
        match self.status {
            RenderStatus::Completed => 100,
            RenderStatus::Queued => 0,
            RenderStatus::Failed => 0,
            RenderStatus::Rendering => {
                let started = self.started_at.unwrap_or(self.requested_at);
                let elapsed = (now - started).num_seconds().max(0) as u64;
                let expected = (self.scene_count.max(1) as u64) * seconds_per_scene.max(1);
                ((elapsed * 100) / expected).min(95) as u8
            }
        }
    }
}

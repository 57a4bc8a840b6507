//! Tracking of out-of-band render jobs.
//!
//! Jobs live inside their session. The tracker only keeps the routing from
//! project id to session so a completion callback, which knows nothing but
//! the project id, can find its way back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    collaborators::{RenderRequest, Renderer, ScenePrompt},
    models::{RenderJob, RenderOutcome, RenderStatus, RenderedOutput},
    registry::SessionRegistry,
    session::SessionId,
    NewsroomError, Result,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderTicket {
    pub project_id: String,
    pub job_id: String,
    pub status: RenderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStatusView {
    pub project_id: String,
    pub job_id: String,
    pub language_code: String,
    pub status: RenderStatus,
    pub progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<RenderedOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionAck {
    pub project_id: String,
    pub status: RenderStatus,
    /// True when the same outcome had already been recorded.
    pub duplicate: bool,
}

pub struct RenderJobTracker {
    registry: Arc<dyn SessionRegistry>,
    renderer: Arc<dyn Renderer>,
    routes: DashMap<String, SessionId>,
    seconds_per_scene: u64,
    callback_url: Option<String>,
}

impl RenderJobTracker {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        renderer: Arc<dyn Renderer>,
        seconds_per_scene: u64,
        callback_url: Option<String>,
    ) -> Self {
        Self {
            registry,
            renderer,
            routes: DashMap::new(),
            seconds_per_scene,
            callback_url,
        }
    }

    /// Queues a render of one language variant and hands it to the renderer
    /// in the background. At most one job per project may be active.
    pub async fn request(&self, session_id: SessionId, language_code: &str) -> Result<RenderTicket> {
        let handle = self
            .registry
            .get(&session_id)
            .ok_or(NewsroomError::SessionNotFound(session_id))?;
        let writer = handle.writer().await;

        let (project_id, request) = writer
            .read(|session| -> Result<(String, RenderRequest)> {
                let project_id = session.project_id(language_code);
                if let Some(job) = session.render_jobs.get(&project_id) {
                    if !job.status.is_terminal() {
                        return Err(NewsroomError::GenerationInProgress(project_id));
                    }
                }
                let breakdown = session
                    .video_package
                    .as_ref()
                    .and_then(|package| package.breakdown(language_code))
                    .filter(|breakdown| !breakdown.scenes.is_empty())
                    .ok_or_else(|| {
                        NewsroomError::ValidationFailed(format!(
                            "no {} scenes to render",
                            language_code
                        ))
                    })?;
                let request = RenderRequest {
                    project_id: project_id.clone(),
                    job_id: Uuid::new_v4().to_string(),
                    language_code: language_code.to_string(),
                    avatar_id: session.config.as_ref().map(|c| c.avatar.id.clone()),
                    scenes: breakdown.scenes.iter().map(ScenePrompt::from).collect(),
                    callback_url: self.callback_url.clone(),
                };
                Ok((project_id, request))
            })
            .await?;

        let job = RenderJob::queued(
            project_id.clone(),
            request.job_id.clone(),
            language_code.to_string(),
            request.scenes.len() as u32,
        );
        writer
            .commit(|session| {
                session.render_jobs.insert(project_id.clone(), job);
            })
            .await;
        self.routes.insert(project_id.clone(), session_id);
        drop(writer);

        tracing::info!(
            "[RENDER] queued {} (job {}, {} scenes)",
            project_id,
            request.job_id,
            request.scenes.len()
        );
        let ticket = RenderTicket {
            project_id,
            job_id: request.job_id.clone(),
            status: RenderStatus::Queued,
        };
        tokio::spawn(dispatch(
            self.registry.clone(),
            self.renderer.clone(),
            session_id,
            request,
        ));
        Ok(ticket)
    }

    /// Records the renderer's outcome. A repeat of the recorded outcome is a
    /// no-op; a different outcome for a finished job is refused.
    pub async fn report_completion(
        &self,
        project_id: &str,
        outcome: RenderOutcome,
    ) -> Result<CompletionAck> {
        let Some(session_id) = self.routes.get(project_id).map(|entry| *entry.value()) else {
            tracing::warn!("[RENDER] completion for unknown project {}", project_id);
            return Err(NewsroomError::UnknownProject(project_id.to_string()));
        };
        let Some(handle) = self.registry.get(&session_id) else {
            tracing::warn!(
                "[RENDER] completion for {} but session {} is gone",
                project_id,
                session_id
            );
            self.routes.remove(project_id);
            return Err(NewsroomError::UnknownProject(project_id.to_string()));
        };

        let writer = handle.writer().await;
        let current = writer
            .read(|session| session.render_jobs.get(project_id).cloned())
            .await
            .ok_or_else(|| NewsroomError::UnknownProject(project_id.to_string()))?;

        if current.status.is_terminal() {
            if current.matches_outcome(&outcome) {
                tracing::info!("[RENDER] duplicate completion for {} ignored", project_id);
                return Ok(CompletionAck {
                    project_id: project_id.to_string(),
                    status: current.status,
                    duplicate: true,
                });
            }
            tracing::warn!(
                "[RENDER] refusing to overwrite {:?} result for {}",
                current.status,
                project_id
            );
            return Err(NewsroomError::RenderAlreadyFinalized(project_id.to_string()));
        }

        let status = writer
            .commit(|session| {
                let job = session.render_jobs.get_mut(project_id)?;
                job.finish(outcome);
                Some(job.status)
            })
            .await
            .ok_or_else(|| NewsroomError::UnknownProject(project_id.to_string()))?;

        tracing::info!("[RENDER] {} finished as {:?}", project_id, status);
        Ok(CompletionAck {
            project_id: project_id.to_string(),
            status,
            duplicate: false,
        })
    }

    /// Read-only status with an estimated progress while rendering.
    pub async fn poll(&self, project_id: &str) -> Result<RenderStatusView> {
        let session_id = self
            .routes
            .get(project_id)
            .map(|entry| *entry.value())
            .ok_or_else(|| NewsroomError::UnknownProject(project_id.to_string()))?;
        let handle = self
            .registry
            .get(&session_id)
            .ok_or_else(|| NewsroomError::UnknownProject(project_id.to_string()))?;

        let seconds_per_scene = self.seconds_per_scene;
        handle
            .read(|session| {
                session
                    .render_jobs
                    .get(project_id)
                    .map(|job| status_view(job, seconds_per_scene, Utc::now()))
            })
            .await
            .ok_or_else(|| NewsroomError::UnknownProject(project_id.to_string()))
    }
}

fn status_view(job: &RenderJob, seconds_per_scene: u64, now: DateTime<Utc>) -> RenderStatusView {
    RenderStatusView {
        project_id: job.project_id.clone(),
        job_id: job.job_id.clone(),
        language_code: job.language_code.clone(),
        status: job.status,
        progress_percent: job.progress_percent(seconds_per_scene, now),
        output: job.output.clone(),
        failure_reason: job.failure_reason.clone(),
        requested_at: job.requested_at,
        finished_at: job.finished_at,
    }
}

async fn dispatch(
    registry: Arc<dyn SessionRegistry>,
    renderer: Arc<dyn Renderer>,
    session_id: SessionId,
    request: RenderRequest,
) {
    let result = renderer.dispatch(&request).await;
    let Some(handle) = registry.get(&session_id) else {
        return;
    };
    let writer = handle.writer().await;
    writer
        .commit(|session| {
            let Some(job) = session.render_jobs.get_mut(&request.project_id) else {
                return;
            };
            if job.job_id != request.job_id {
                return;
            }
            match &result {
                Ok(()) => {
                    job.advance(RenderStatus::Rendering);
                }
                Err(e) => {
                    tracing::warn!("[RENDER] dispatch of {} failed: {}", request.project_id, e);
                    job.finish(RenderOutcome::Failed {
                        reason: e.to_string(),
                    });
                }
            }
        })
        .await;
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::{
    AvatarAdvisor, AvatarBrief, ChatModel, ChatRequest, CollaboratorError, ComplianceReviewer, ExtractionRequest,
    FactExtractor, ImageGenerator, RenderRequest, Renderer, ScriptWriter, SocialCopywriter,
    Translator,
};
use crate::{
    config::NewsroomConfig,
    models::{
        Character, ComplianceReport, FactSheet, FrameRole, GenerationConfig, ImageRef, Language,
        Scene, ScriptDraft, SocialPackage, SocialPlatform, VideoPackage,
    },
};

/// Client for the generation gateway that fronts every model-backed service.
pub struct HttpCollaborators {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpCollaborators {
    pub fn new(config: &NewsroomConfig) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.agent_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.gateway_url.trim_end_matches('/').to_string(),
            api_key: config.gateway_api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, CollaboratorError> {
        let mut request = self.client.post(self.endpoint(path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        tracing::debug!("[GATEWAY] POST {}", path);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollaboratorError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, CollaboratorError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(path, body).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| CollaboratorError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ExtractionEvent {
    Thought { message: String },
    Result { fact_sheet: FactSheet },
    Error { message: String },
}

#[async_trait]
impl FactExtractor for HttpCollaborators {
    async fn extract(&self, request: &ExtractionRequest) -> Result<FactSheet, CollaboratorError> {
        self.post("extract", request).await
    }

    /// Reads newline-delimited JSON events from the gateway's streaming endpoint.
    async fn extract_streaming(
        &self,
        request: &ExtractionRequest,
        thoughts: mpsc::Sender<String>,
    ) -> Result<FactSheet, CollaboratorError> {
        let mut response = self.send("extract/stream", request).await?;
        let mut lines = LineBuffer::default();

        while let Some(chunk) = response.chunk().await? {
            lines.extend(&chunk);
            while let Some(line) = lines.next_line() {
                match parse_event(&line) {
                    None => continue,
                    Some(Ok(ExtractionEvent::Thought { message })) => {
                        let _ = thoughts.send(message).await;
                    }
                    Some(Ok(ExtractionEvent::Result { fact_sheet })) => return Ok(fact_sheet),
                    Some(Ok(ExtractionEvent::Error { message })) => {
                        return Err(CollaboratorError::Rejected(message))
                    }
                    Some(Err(e)) => tracing::debug!("[GATEWAY] skipping stream line: {}", e),
                }
            }
        }

        if let Some(Ok(ExtractionEvent::Result { fact_sheet })) = parse_event(&lines.remainder()) {
            return Ok(fact_sheet);
        }
        Err(CollaboratorError::Malformed(
            "extraction stream ended without a result".to_string(),
        ))
    }
}

/// Splits a byte stream on `\n`. Bytes are only decoded once a whole line
/// has arrived, so multi-byte characters may straddle chunk boundaries.
#[derive(Debug, Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<Vec<u8>> {
        let newline = self.pending.iter().position(|b| *b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=newline).collect();
        line.pop();
        Some(line)
    }

    fn remainder(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }
}

/// `None` for blank lines.
fn parse_event(line: &[u8]) -> Option<serde_json::Result<ExtractionEvent>> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return None;
    }
    Some(serde_json::from_slice(line))
}

#[async_trait]
impl ScriptWriter for HttpCollaborators {
    async fn write_script(
        &self,
        fact_sheet: &FactSheet,
        config: &GenerationConfig,
        target_duration_secs: u32,
    ) -> Result<ScriptDraft, CollaboratorError> {
        let body = json!({
            "fact_sheet": fact_sheet,
            "config": config,
            "target_duration_seconds": target_duration_secs,
        });
        self.post("script", &body).await
    }
}

#[derive(Deserialize)]
struct TranslationResponse {
    scenes: Vec<Scene>,
}

#[async_trait]
impl Translator for HttpCollaborators {
    async fn translate(
        &self,
        draft: &ScriptDraft,
        language: Language,
    ) -> Result<Vec<Scene>, CollaboratorError> {
        let body = json!({
            "scenes": draft.scenes,
            "master_script": draft.master_script,
            "language": language,
            "language_code": language.code(),
        });
        let response: TranslationResponse = self.post("translate", &body).await?;
        Ok(response.scenes)
    }
}

#[async_trait]
impl ImageGenerator for HttpCollaborators {
    async fn character_image(&self, character: &Character) -> Result<ImageRef, CollaboratorError> {
        self.post("images/character", character).await
    }

    async fn scene_frame(
        &self,
        scene_id: u32,
        frame: FrameRole,
        prompt: &str,
    ) -> Result<ImageRef, CollaboratorError> {
        let body = json!({ "scene_id": scene_id, "frame": frame, "prompt": prompt });
        self.post("images/frame", &body).await
    }
}

#[async_trait]
impl ComplianceReviewer for HttpCollaborators {
    async fn review(
        &self,
        package: &VideoPackage,
        standards: &[String],
    ) -> Result<ComplianceReport, CollaboratorError> {
        let body = json!({ "video_package": package, "standards": standards });
        self.post("compliance", &body).await
    }
}

#[async_trait]
impl SocialCopywriter for HttpCollaborators {
    async fn write_social(
        &self,
        fact_sheet: &FactSheet,
        package: &VideoPackage,
        platform: SocialPlatform,
    ) -> Result<SocialPackage, CollaboratorError> {
        let body = json!({
            "fact_sheet": fact_sheet,
            "video_package": package,
            "platform": platform,
        });
        self.post("social", &body).await
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
}

#[async_trait]
impl ChatModel for HttpCollaborators {
    async fn complete(&self, request: &ChatRequest) -> Result<String, CollaboratorError> {
        let response: ChatResponse = self.post("chat", request).await?;
        Ok(response.reply)
    }
}

#[derive(Deserialize)]
struct AvatarResponse {
    avatar_ids: Vec<String>,
}

#[async_trait]
impl AvatarAdvisor for HttpCollaborators {
    async fn recommend(&self, brief: &AvatarBrief) -> Result<Vec<String>, CollaboratorError> {
        let response: AvatarResponse = self.post("avatars/recommend", brief).await?;
        Ok(response.avatar_ids)
    }
}

#[async_trait]
impl Renderer for HttpCollaborators {
    async fn dispatch(&self, request: &RenderRequest) -> Result<(), CollaboratorError> {
        self.send("render", request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_join_cleanly() {
        let config = NewsroomConfig {
            gateway_url: "http://gateway.local:9000/".to_string(),
            ..NewsroomConfig::for_tests()
        };
        let gateway = HttpCollaborators::new(&config).unwrap();
        assert_eq!(gateway.endpoint("/extract"), "http://gateway.local:9000/extract");
        assert_eq!(gateway.endpoint("images/frame"), "http://gateway.local:9000/images/frame");
    }

    #[test]
    fn stream_events_parse() {
        let event: ExtractionEvent =
            serde_json::from_str(r#"{"type":"thought","message":"Checking sources"}"#).unwrap();
        assert!(matches!(event, ExtractionEvent::Thought { .. }));
        let event: ExtractionEvent =
            serde_json::from_str(r#"{"type":"error","message":"quota"}"#).unwrap();
        assert!(matches!(event, ExtractionEvent::Error { .. }));
    }

    #[test]
    fn characters_split_across_chunks_survive() {
        let line = "{\"type\":\"thought\",\"message\":\"诈骗 மோசடி\"}\n".as_bytes();
        // Cut inside the three-byte encoding of the first character.
        let cut = line.iter().position(|b| *b >= 0x80).unwrap() + 1;

        let mut lines = LineBuffer::default();
        lines.extend(&line[..cut]);
        assert!(lines.next_line().is_none());
        lines.extend(&line[cut..]);
        let decoded = lines.next_line().unwrap();

        match parse_event(&decoded) {
            Some(Ok(ExtractionEvent::Thought { message })) => assert_eq!(message, "诈骗 மோசடி"),
            other => panic!("unexpected parse: {:?}", other.map(|r| r.is_ok())),
        }
        assert!(lines.next_line().is_none());
    }

    #[test]
    fn blank_lines_and_unterminated_tail() {
        let mut lines = LineBuffer::default();
        lines.extend(b"\r\n\n{\"type\":\"error\",\"message\":\"quota\"}");
        assert!(parse_event(&lines.next_line().unwrap()).is_none());
        assert!(parse_event(&lines.next_line().unwrap()).is_none());
        assert!(lines.next_line().is_none());
        assert!(matches!(
            parse_event(&lines.remainder()),
            Some(Ok(ExtractionEvent::Error { .. }))
        ));
    }
}

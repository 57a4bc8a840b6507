//! Chat-driven edits to session documents.
//!
//! The chat model sees the document, the JSON Schema of what it may change
//! and a trimmed history. Its reply may carry an update block; the engine
//! splits that off and validates it into a typed patch. Applying the patch
//! is left to the caller, which holds the session lock.

pub mod extract;
pub mod patch;

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use self::{
    extract::split_reply,
    patch::{parse_patch, patch_schema, DocumentPatch},
};
use crate::collaborators::{ChatModel, ChatRequest, CollaboratorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatTarget {
    Factsheet,
    VideoPackage,
    Characters,
    PreviewFrames,
    Social,
}

impl fmt::Display for ChatTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChatTarget::Factsheet => "factsheet",
            ChatTarget::VideoPackage => "video-package",
            ChatTarget::Characters => "characters",
            ChatTarget::PreviewFrames => "preview-frames",
            ChatTarget::Social => "social",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// What the officer typed plus the conversation so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatInput {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

impl ChatInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatchProposal<P> {
    NoChange,
    Valid(P),
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct Proposal<P> {
    pub reply: String,
    pub patch: PatchProposal<P>,
}

/// Result of one chat turn as returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_patch: Option<Value>,
    /// Why a proposed change was not applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ChatReply {
    pub fn unchanged(reply: String, rejection: Option<String>) -> Self {
        Self {
            reply,
            updated: false,
            applied_patch: None,
            rejection,
            warnings: Vec::new(),
        }
    }

    pub fn applied<P: Serialize>(reply: String, patch: &P) -> Self {
        Self {
            reply,
            updated: true,
            applied_patch: serde_json::to_value(patch).ok(),
            rejection: None,
            warnings: Vec::new(),
        }
    }
}

pub struct ChatPatchEngine {
    model: Arc<dyn ChatModel>,
    history_window: usize,
}

impl ChatPatchEngine {
    pub fn new(model: Arc<dyn ChatModel>, history_window: usize) -> Self {
        Self {
            model,
            history_window,
        }
    }

    fn recent_history(&self, history: &[ChatMessage]) -> Vec<ChatMessage> {
        let skip = history.len().saturating_sub(self.history_window);
        history[skip..].to_vec()
    }

    /// Asks the chat model about `document` and validates any update it proposes as `P`.
    pub async fn propose<P: DocumentPatch>(
        &self,
        target: ChatTarget,
        document: Value,
        input: &ChatInput,
        context: Option<String>,
    ) -> Result<Proposal<P>, CollaboratorError> {
        let request = ChatRequest {
            target,
            document,
            update_schema: patch_schema::<P>(),
            message: input.message.clone(),
            history: self.recent_history(&input.history),
            context,
        };
        let raw = self.model.complete(&request).await?;
        let extracted = split_reply(&raw);

        let patch = match extracted.updates {
            None => PatchProposal::NoChange,
            Some(Err(reason)) => PatchProposal::Invalid(reason),
            Some(Ok(updates)) => match parse_patch::<P>(updates) {
                Ok(patch) if patch.is_empty() => PatchProposal::NoChange,
                Ok(patch) => PatchProposal::Valid(patch),
                Err(reason) => PatchProposal::Invalid(reason),
            },
        };
        if let PatchProposal::Invalid(reason) = &patch {
            tracing::warn!("[CHAT] {} update refused: {}", target, reason);
        }

        Ok(Proposal {
            reply: extracted.reply,
            patch,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{patch::FactSheetPatch, *};
    use crate::testing::ScriptedChat;

    fn history(n: usize) -> Vec<ChatMessage> {
        (0..n)
            .map(|i| ChatMessage {
                role: if i % 2 == 0 { ChatRole::User } else { ChatRole::Assistant },
                content: format!("message {}", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn forwards_only_recent_history_and_schema() {
        let chat = Arc::new(ScriptedChat::new(vec!["Sure.".to_string()]));
        let engine = ChatPatchEngine::new(chat.clone(), 10);
        let input = ChatInput {
            message: "tighten the hook".to_string(),
            history: history(14),
        };
        let proposal = engine
            .propose::<FactSheetPatch>(ChatTarget::Factsheet, json!({}), &input, None)
            .await
            .unwrap();
        assert_eq!(proposal.patch, PatchProposal::NoChange);

        let sent = chat.requests();
        assert_eq!(sent[0].history.len(), 10);
        assert_eq!(sent[0].history[0].content, "message 4");
        assert!(sent[0].update_schema["properties"].get("story_hook").is_some());
    }

    #[tokio::test]
    async fn invalid_updates_keep_reply() {
        let chat = Arc::new(ScriptedChat::new(vec![
            "Marked verified.\n```json\n{\"updates\": {\"verified_by_officer\": true}}\n```".to_string(),
        ]));
        let engine = ChatPatchEngine::new(chat, 10);
        let proposal = engine
            .propose::<FactSheetPatch>(ChatTarget::Factsheet, json!({}), &ChatInput::new("verify it"), None)
            .await
            .unwrap();
        assert_eq!(proposal.reply, "Marked verified.");
        assert!(matches!(proposal.patch, PatchProposal::Invalid(_)));
    }

    #[test]
    fn targets_use_route_names() {
        assert_eq!(serde_json::to_value(ChatTarget::VideoPackage).unwrap(), "video-package");
        assert_eq!(ChatTarget::PreviewFrames.to_string(), "preview-frames");
    }
}

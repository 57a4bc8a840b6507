use serde::{Deserialize, Serialize};

/// Where a generated still lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageRef {
    Url { url: String },
    /// `data:` URI carrying the encoded image.
    Inline { data_uri: String },
}

/// Finished video as reported by the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderedOutput {
    Url { url: String },
    Inline { mime_type: String, data_base64: String },
    Object { bucket: String, key: String },
}

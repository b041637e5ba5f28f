//! # Schemas Module
//!
//! Data structures for the two sides of the relay: the inbound generate
//! request from the browser, the outbound OpenAI-compatible completion
//! request, and the incremental chunks the provider streams back.

use serde::{Deserialize, Serialize};

/// Inbound request body for `POST /generate`.
///
/// `api_key` is only honored when the server runs in user-supplied-key mode;
/// it is deserialized here and handed to the credential selector, never
/// serialized into the upstream body.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub api_key: Option<String>,
}

/// Outbound chat completion request.
///
/// The credential travels exclusively in the `Authorization` header and has
/// no field here, so it cannot leak into the serialized body.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
    pub stream: bool,
    pub n: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One incremental chunk from the provider's event stream.
///
/// Decoding is deliberately permissive: the provider emits control events
/// (role announcements, finish markers) that carry no text, so every field
/// defaults rather than erroring when absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionChunk {
    /// The text delta carried by this chunk, or `""` for control events.
    pub fn delta_text(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .unwrap_or("")
    }

    /// Consume the chunk, taking ownership of its delta text.
    pub fn into_delta_text(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .unwrap_or_default()
    }
}

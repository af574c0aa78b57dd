use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Role, Usage};

/// Response from a (non-streamed) chat completion
///
/// The plain endpoint answers with one `message` per choice, the
/// data-source endpoint with a `messages` list (tool citations followed by
/// the assistant answer). Identity fields may come back empty from the
/// data-source endpoint, hence the defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub object: String,

    #[serde(default)]
    pub created: u64,

    #[serde(default)]
    pub model: String,

    pub choices: Vec<Choice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,

    /// The completion message (plain endpoint)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,

    /// Tool and assistant messages (data-source endpoint), kept verbatim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<Value>>,

    /// Reason for stopping
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// A message as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub role: Role,

    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Get the first choice, if available
    pub fn first_choice(&self) -> Option<&Choice> {
        self.choices.first()
    }

    /// Text of the assistant answer in the first choice, if any
    pub fn content(&self) -> Option<&str> {
        let choice = self.first_choice()?;
        if let Some(message) = &choice.message {
            return message.content.as_deref();
        }
        choice
            .messages
            .as_ref()?
            .iter()
            .rev()
            .find(|message| message.get("role").and_then(Value::as_str) == Some("assistant"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
    }
}

/// One streamed chunk of a chat completion
///
/// Deltas stay raw JSON: a tool delta is forwarded to the client exactly as
/// the service sent it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub created: u64,

    #[serde(default)]
    pub object: String,

    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// Streaming choice in either endpoint's shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,

    /// Plain endpoint: `choices[i].delta`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Value>,

    /// Data-source endpoint: `choices[i].messages[j].delta`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChunkMessage>>,

    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMessage {
    #[serde(default)]
    pub index: u32,

    pub delta: Value,
}

impl ChatChunk {
    /// The delta of the first choice, whichever shape the endpoint used
    pub fn first_delta(&self) -> Option<&Value> {
        let choice = self.choices.first()?;
        choice
            .messages
            .as_ref()
            .and_then(|messages| messages.first())
            .map(|message| &message.delta)
            .or(choice.delta.as_ref())
    }
}

/// Response from an embeddings deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsResponse {
    #[serde(default)]
    pub object: String,
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Embedding data item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingData {
    #[serde(default)]
    pub object: String,
    pub embedding: Vec<f32>,
    pub index: u32,
}

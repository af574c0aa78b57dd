//! Conversation transcripts
//!
//! Every save creates a new document; nothing is ever updated or deleted.

use std::sync::LazyLock;

use async_trait::async_trait;
use azure_openai_ox::ChatMessage;
use cosmos_ox::{ContainerClient, CosmosClient, Query};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{RelayError, config::CosmosSettings};

/// `[doc1]`-style citation markers
#[allow(clippy::expect_used)]
static CITATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[.*?\]").expect("citation pattern is valid"));

/// Remove every bracketed span, non-greedily
pub fn strip_citations(text: &str) -> String {
    CITATION.replace_all(text, "").into_owned()
}

/// Body of `/saveconversation`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub title: String,
    pub user: String,
    pub messages: Vec<ChatMessage>,
}

/// Body of `/selectconversationhistory`
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRequest {
    pub user: String,
}

/// A stored transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    pub user: String,
    pub messages: Vec<ChatMessage>,
}

impl Conversation {
    /// New transcript with a fresh id and citation markers removed
    pub fn new(request: SaveRequest) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: request.title,
            user: request.user,
            messages: request
                .messages
                .into_iter()
                .map(|message| ChatMessage {
                    content: strip_citations(&message.content),
                    ..message
                })
                .collect(),
        }
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Every stored document of `user`, as stored
    async fn history(&self, user: &str) -> Result<Vec<Value>, RelayError>;

    /// Insert a new document
    async fn save(&self, conversation: &Conversation) -> Result<(), RelayError>;
}

/// Cosmos DB container store
#[derive(Debug, Clone)]
pub struct CosmosConversationStore {
    container: ContainerClient,
}

impl CosmosConversationStore {
    pub fn new(container: ContainerClient) -> Self {
        Self { container }
    }

    pub fn from_settings(settings: &CosmosSettings) -> Result<Self, RelayError> {
        let container = CosmosClient::new(&settings.host, &settings.master_key)?
            .database(&settings.database_id)
            .container(&settings.container_id);
        Ok(Self::new(container))
    }
}

#[async_trait]
impl ConversationStore for CosmosConversationStore {
    async fn history(&self, user: &str) -> Result<Vec<Value>, RelayError> {
        let query = Query::new("SELECT * FROM r WHERE r.user=@user").with_parameter("@user", user);
        let documents = self.container.query_items(&query, true).await?;
        log::debug!("{} conversations for {user}", documents.len());
        Ok(documents)
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RelayError> {
        self.container.create_item(conversation).await?;
        log::info!("saved conversation {}", conversation.id);
        Ok(())
    }
}

/// Process-local store for tests and credential-less runs
#[derive(Debug, Default)]
pub struct InMemoryConversationStore {
    documents: RwLock<Vec<Conversation>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn history(&self, user: &str) -> Result<Vec<Value>, RelayError> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .filter(|conversation| conversation.user == user)
            .map(|conversation| {
                serde_json::to_value(conversation)
                    .map_err(|e| RelayError::parse(format!("cannot encode conversation: {e}")))
            })
            .collect()
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RelayError> {
        self.documents.write().await.push(conversation.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(user: &str, content: &str) -> SaveRequest {
        SaveRequest {
            title: "Greeting".to_string(),
            user: user.to_string(),
            messages: vec![
                ChatMessage::user("hi"),
                ChatMessage::assistant(content),
            ],
        }
    }

    #[test]
    fn test_strip_citations() {
        assert_eq!(strip_citations("Paris [doc1] is big [doc2]."), "Paris  is big .");
        assert_eq!(strip_citations("[a] b [c]"), " b ");
        assert_eq!(strip_citations("no markers"), "no markers");
    }

    #[test]
    fn test_strip_citations_is_idempotent() {
        for text in ["x [doc1] y", "[[nested]]", "open [ only", "[a][b]c"] {
            let once = strip_citations(text);
            assert_eq!(strip_citations(&once), once, "{text}");
        }
    }

    #[test]
    fn test_new_conversation() {
        let first = Conversation::new(request("u1", "It is sunny [doc1]."));
        let second = Conversation::new(request("u1", "It is sunny [doc1]."));

        assert_ne!(first.id, second.id);
        assert!(Uuid::parse_str(&first.id).is_ok());
        assert_eq!(first.messages[1].content, "It is sunny .");
        assert_eq!(first.messages[0], ChatMessage::user("hi"));
    }

    #[tokio::test]
    async fn test_save_then_fetch() {
        let store = InMemoryConversationStore::new();
        let conversation = Conversation::new(request("u1", "hello"));
        store.save(&conversation).await.unwrap();
        store
            .save(&Conversation::new(request("u2", "other")))
            .await
            .unwrap();

        let history = store.history("u1").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["user"], "u1");
        assert_eq!(history[0]["id"], conversation.id.as_str());
    }
}

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::ChatMessage;

/// Which deployment endpoint a chat request is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `deployments/{deployment}/chat/completions`
    ChatCompletions,
    /// `deployments/{deployment}/extensions/chat/completions`, the
    /// data-source ("on your data") endpoint
    ExtensionsChatCompletions,
}

impl Target {
    /// Path below the resource's `/openai` root
    pub fn path(&self, deployment: &str) -> String {
        match self {
            Target::ChatCompletions => format!("deployments/{deployment}/chat/completions"),
            Target::ExtensionsChatCompletions => {
                format!("deployments/{deployment}/extensions/chat/completions")
            }
        }
    }
}

/// Request for chat completion
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[builder(builder_type(vis = "pub"), state_mod(vis = "pub"))]
pub struct ChatRequest {
    /// List of messages in the conversation
    #[builder(field)]
    pub messages: Vec<ChatMessage>,

    /// Search indexes the service should ground its answer in
    #[serde(rename = "dataSources", skip_serializing_if = "Option::is_none")]
    #[builder(field)]
    pub data_sources: Option<Vec<DataSource>>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Top-p sampling parameter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Stop sequences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    /// Whether to stream the response
    #[serde(default)]
    #[builder(default)]
    pub stream: bool,
}

// Builder extensions for convenience methods
impl<S: chat_request_builder::State> ChatRequestBuilder<S> {
    /// Add a message
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Add several messages, keeping their order
    pub fn messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Attach a data source
    pub fn data_source(mut self, data_source: DataSource) -> Self {
        self.data_sources
            .get_or_insert_with(Vec::new)
            .push(data_source);
        self
    }
}

/// A retrieval source attached to an `extensions` chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    #[serde(rename = "type")]
    pub kind: DataSourceKind,
    pub parameters: SearchParameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSourceKind {
    AzureCognitiveSearch,
}

impl DataSource {
    pub fn azure_cognitive_search(parameters: SearchParameters) -> Self {
        Self {
            kind: DataSourceKind::AzureCognitiveSearch,
            parameters,
        }
    }
}

/// Parameters of an Azure Cognitive Search data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(rename_all = "camelCase")]
pub struct SearchParameters {
    /// `https://{service}.search.windows.net`
    #[builder(into)]
    pub endpoint: String,
    #[builder(into)]
    pub key: String,
    #[builder(into)]
    pub index_name: String,
    #[builder(default)]
    pub fields_mapping: FieldsMapping,
    /// Restrict answers to the retrieved documents
    #[builder(default = true)]
    pub in_scope: bool,
    #[serde(rename = "topNDocuments")]
    #[builder(default = 5)]
    pub top_n_documents: u32,
    #[builder(default)]
    pub query_type: QueryType,
    /// Semantic configuration name; empty unless `query_type` is semantic
    #[builder(default)]
    pub semantic_configuration: String,
    /// System message for the grounded answer
    pub role_information: Option<String>,
}

/// Index columns the service reads documents from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsMapping {
    pub content_field: Vec<String>,
    pub title_field: Option<String>,
    pub url_field: Option<String>,
    pub filepath_field: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    #[default]
    Simple,
    Semantic,
}

/// Request for text embeddings on an embedding deployment
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct EmbeddingsRequest {
    /// Text to embed
    #[builder(into)]
    pub input: String,

    /// User identifier for abuse monitoring
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub user: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_embeddings_request_body() {
        let request = EmbeddingsRequest::builder().input("Text").build();
        assert_eq!(serde_json::to_value(&request).unwrap(), json!({"input": "Text"}));
    }

    #[test]
    fn test_target_paths() {
        assert_eq!(
            Target::ChatCompletions.path("chat"),
            "deployments/chat/chat/completions"
        );
        assert_eq!(
            Target::ExtensionsChatCompletions.path("chat"),
            "deployments/chat/extensions/chat/completions"
        );
    }

    #[test]
    fn test_data_source_wire_format() {
        let parameters = SearchParameters::builder()
            .endpoint("https://search.search.windows.net")
            .key("k")
            .index_name("docs")
            .fields_mapping(FieldsMapping {
                content_field: vec!["content".to_string(), "summary".to_string()],
                title_field: Some("title".to_string()),
                url_field: None,
                filepath_field: None,
            })
            .query_type(QueryType::Semantic)
            .semantic_configuration("default".to_string())
            .role_information("Be brief.".to_string())
            .build();

        let value = serde_json::to_value(DataSource::azure_cognitive_search(parameters)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "AzureCognitiveSearch",
                "parameters": {
                    "endpoint": "https://search.search.windows.net",
                    "key": "k",
                    "indexName": "docs",
                    "fieldsMapping": {
                        "contentField": ["content", "summary"],
                        "titleField": "title",
                        "urlField": null,
                        "filepathField": null
                    },
                    "inScope": true,
                    "topNDocuments": 5,
                    "queryType": "semantic",
                    "semanticConfiguration": "default",
                    "roleInformation": "Be brief."
                }
            })
        );
    }

    #[test]
    fn test_chat_request_omits_unset_fields() {
        let request = ChatRequest::builder()
            .message(ChatMessage::user("hi"))
            .temperature(0.5)
            .build();

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.5,
                "stream": false
            })
        );
    }
}

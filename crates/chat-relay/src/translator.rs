//! Inbound chat body to provider request

use std::sync::Arc;

use azure_openai_ox::{
    CHATGPT_URL_API_VERSION, ChatMessage, ChatRequest, DataSource, ModelFamily,
    SearchParameters, Target,
};
use serde::Deserialize;

use crate::{RelayError, Settings};

/// Sent as `x-ms-useragent` to the data-source endpoint
pub const USER_AGENT: &str = concat!("chat-relay/", env!("CARGO_PKG_VERSION"));

/// Body of `/conversation`; other keys are ignored
#[derive(Debug, Clone, Deserialize)]
pub struct InboundChat {
    pub messages: Vec<ChatMessage>,
}

/// A provider request ready to send
#[derive(Debug, Clone)]
pub struct TranslatedRequest {
    pub body: ChatRequest,
    pub target: Target,
    /// Sent in addition to the client's `api-key`
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct RequestTranslator {
    settings: Arc<Settings>,
}

impl RequestTranslator {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    pub fn translate(&self, inbound: &InboundChat) -> Result<TranslatedRequest, RelayError> {
        let openai = &self.settings.openai;

        let temperature = openai
            .temperature
            .ok_or_else(|| RelayError::configuration("AZURE_OPENAI_TEMPERATURE is not set"))?;
        let top_p = openai
            .top_p
            .ok_or_else(|| RelayError::configuration("AZURE_OPENAI_TOP_P is not set"))?;
        let max_tokens = openai
            .max_tokens
            .ok_or_else(|| RelayError::configuration("AZURE_OPENAI_MAX_TOKENS is not set"))?;

        let Some(search) = &self.settings.search else {
            let body = ChatRequest::builder()
                .messages(openai.system_message.iter().map(ChatMessage::system))
                .messages(inbound.messages.iter().cloned())
                .temperature(temperature)
                .top_p(top_p)
                .max_tokens(max_tokens)
                .maybe_stop(openai.stop_sequence.clone())
                .stream(openai.stream)
                .build();

            return Ok(TranslatedRequest {
                body,
                target: Target::ChatCompletions,
                headers: Vec::new(),
            });
        };

        let (_, _, key) = openai.credentials()?;
        let family = openai
            .model_name
            .as_deref()
            .map_or(ModelFamily::Completion, ModelFamily::from_model_name);
        let chatgpt_url = format!(
            "{}/{}?api-version={CHATGPT_URL_API_VERSION}",
            openai.deployment_url()?,
            family.path()
        );

        let semantic_configuration = if search.use_semantic_search {
            search.semantic_search_config.clone()
        } else {
            String::new()
        };
        let parameters = SearchParameters::builder()
            .endpoint(search.endpoint.clone())
            .key(search.key.clone())
            .index_name(search.index.clone())
            .fields_mapping(search.fields.clone())
            .in_scope(search.enable_in_domain)
            .top_n_documents(search.top_k)
            .query_type(search.query_type())
            .semantic_configuration(semantic_configuration)
            .maybe_role_information(openai.system_message.clone())
            .build();

        let body = ChatRequest::builder()
            .messages(inbound.messages.iter().cloned())
            .data_source(DataSource::azure_cognitive_search(parameters))
            .temperature(temperature)
            .top_p(top_p)
            .max_tokens(max_tokens)
            .maybe_stop(openai.stop_sequence.clone())
            .stream(openai.stream)
            .build();

        Ok(TranslatedRequest {
            body,
            target: Target::ExtensionsChatCompletions,
            headers: vec![
                ("chatgpt_url".to_string(), chatgpt_url),
                ("chatgpt_key".to_string(), key.to_string()),
                ("x-ms-useragent".to_string(), USER_AGENT.to_string()),
            ],
        })
    }
}

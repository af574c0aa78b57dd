//! Whole-answer and streamed replies for `/conversation`

use std::sync::Arc;

use azure_openai_ox::{AzureOpenAI, ChatResponse};
use futures_util::stream::BoxStream;
use serde_json::json;

use crate::{
    AggregateResponse, InboundChat, RelayError, RequestTranslator, Settings,
    reassembler::{AggregateChoice, reassemble},
};

/// What `/conversation` sends back
pub enum CompletionReply {
    /// Newline-delimited aggregate frames
    Stream(BoxStream<'static, String>),
    /// One complete answer
    Json(AggregateResponse),
}

impl std::fmt::Debug for CompletionReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompletionReply::Stream(_) => f.write_str("CompletionReply::Stream(..)"),
            CompletionReply::Json(response) => {
                f.debug_tuple("CompletionReply::Json").field(response).finish()
            }
        }
    }
}

/// Forwards chat requests to the completion deployment
#[derive(Debug, Clone)]
pub struct CompletionService {
    settings: Arc<Settings>,
    translator: RequestTranslator,
    client: Option<AzureOpenAI>,
}

impl CompletionService {
    /// Client built from the settings; without credentials every call fails
    /// with a configuration error
    pub fn new(settings: Arc<Settings>) -> Self {
        let client = settings.openai.credentials().ok().map(|(resource, model, key)| {
            AzureOpenAI::new(resource, model, key, &settings.openai.preview_api_version)
        });
        if client.is_none() {
            log::warn!("completion service is not configured");
        }
        Self::with_client(settings, client)
    }

    pub fn with_client(settings: Arc<Settings>, client: Option<AzureOpenAI>) -> Self {
        Self {
            translator: RequestTranslator::new(settings.clone()),
            settings,
            client,
        }
    }

    pub fn streaming(&self) -> bool {
        self.settings.openai.stream
    }

    pub async fn complete(&self, inbound: &InboundChat) -> Result<CompletionReply, RelayError> {
        let client = self.client.as_ref().ok_or_else(|| {
            RelayError::configuration(
                "AZURE_OPENAI_RESOURCE, AZURE_OPENAI_MODEL and AZURE_OPENAI_KEY must be set",
            )
        })?;
        let translated = self.translator.translate(inbound)?;

        if translated.body.stream {
            let lines = client.stream_lines(translated.target, &translated.body, &translated.headers);
            Ok(CompletionReply::Stream(reassemble(
                lines,
                self.settings.server.stream_error_policy,
            )))
        } else {
            let response = client
                .send(translated.target, &translated.body, &translated.headers)
                .await?;
            Ok(CompletionReply::Json(reshape(response)))
        }
    }
}

/// Non-streamed answer in the streamed aggregate's shape
///
/// Data-source `messages` are carried over verbatim; a plain `message`
/// becomes a single assistant entry.
pub fn reshape(response: ChatResponse) -> AggregateResponse {
    let choices = response
        .choices
        .into_iter()
        .map(|choice| {
            let messages = match (choice.messages, choice.message) {
                (Some(messages), _) => messages,
                (None, Some(message)) => vec![json!({
                    "role": "assistant",
                    "content": message.content.unwrap_or_default()
                })],
                (None, None) => Vec::new(),
            };
            AggregateChoice { messages }
        })
        .collect::<Vec<_>>();

    AggregateResponse {
        id: response.id,
        model: response.model,
        created: response.created,
        object: response.object,
        choices: if choices.is_empty() {
            vec![AggregateChoice::default()]
        } else {
            choices
        },
    }
}

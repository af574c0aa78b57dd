use bon::Builder;
use futures_util::stream::BoxStream;

use crate::{
    AzureOpenAIError, ChatRequest, ChatResponse, EmbeddingsRequest,
    EmbeddingsResponse, Target, internal::AzureOpenAIRequestHelper,
};

/// `https://{resource}.openai.azure.com/openai`
pub fn resource_url(resource: &str) -> String {
    format!("https://{resource}.openai.azure.com/openai")
}

/// Azure OpenAI client bound to one chat deployment
#[derive(Debug, Clone, Builder)]
pub struct AzureOpenAI {
    /// API key for authentication
    #[builder(into)]
    api_key: String,

    /// Deployment that serves chat requests
    #[builder(into)]
    deployment: String,

    /// `api-version` query parameter sent with every call
    #[builder(into)]
    api_version: String,

    /// Resource root, `https://{resource}.openai.azure.com/openai` in production
    #[builder(into)]
    base_url: String,

    /// HTTP client for making requests
    #[builder(skip)]
    client: reqwest::Client,
}

impl AzureOpenAI {
    /// Create a client for a deployment on the given Azure OpenAI resource
    pub fn new(
        resource: impl AsRef<str>,
        deployment: impl Into<String>,
        api_key: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: api_version.into(),
            base_url: resource_url(resource.as_ref()),
            client: reqwest::Client::new(),
        }
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    fn helper(&self) -> AzureOpenAIRequestHelper {
        AzureOpenAIRequestHelper::new(
            self.client.clone(),
            &self.base_url,
            &self.api_key,
            &self.api_version,
        )
    }

    /// Send a chat request and wait for the whole answer
    pub async fn send(
        &self,
        target: Target,
        request: &ChatRequest,
        extra_headers: &[(String, String)],
    ) -> Result<ChatResponse, AzureOpenAIError> {
        log::debug!("sending chat request to {target:?} on {}", self.deployment);
        self.helper()
            .send_chat_request(target.path(&self.deployment), request, extra_headers)
            .await
    }

    /// Send a chat request and get the streamed body back line by line
    ///
    /// Lines are not decoded; the data-source endpoint and the plain endpoint
    /// use different chunk shapes and callers fold them themselves.
    pub fn stream_lines(
        &self,
        target: Target,
        request: &ChatRequest,
        extra_headers: &[(String, String)],
    ) -> BoxStream<'static, Result<String, AzureOpenAIError>> {
        log::debug!("streaming chat request to {target:?} on {}", self.deployment);
        self.helper()
            .stream_chat_lines(target.path(&self.deployment), request, extra_headers)
    }

    /// Generate embeddings on an embedding deployment
    pub async fn create_embeddings(
        &self,
        deployment: &str,
        request: &EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, AzureOpenAIError> {
        self.helper().create_embeddings(deployment, request).await
    }

    /// Embed a single text and return its vector
    pub async fn embed(&self, deployment: &str, text: &str) -> Result<Vec<f32>, AzureOpenAIError> {
        let request = EmbeddingsRequest::builder()
            .input(text)
            .build();
        let response = self.create_embeddings(deployment, &request).await?;
        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or(AzureOpenAIError::EmptyEmbedding)
    }
}

use futures_util::{StreamExt, stream::BoxStream};
use relay_common::{AuthMethod, Endpoint, HttpMethod, RequestBuilder, RequestConfig};

use crate::{AzureOpenAIError, ChatRequest, ChatResponse, EmbeddingsRequest, EmbeddingsResponse};

/// Azure OpenAI client helper methods using the common RequestBuilder
pub(crate) struct AzureOpenAIRequestHelper {
    request_builder: RequestBuilder,
    api_version: String,
}

impl AzureOpenAIRequestHelper {
    pub(crate) fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: &str,
        api_version: &str,
    ) -> Self {
        let config = RequestConfig::new(base_url).with_auth(AuthMethod::ApiKey {
            header_name: "api-key".to_string(),
            key: api_key.to_string(),
        });

        Self {
            request_builder: RequestBuilder::new(client, config),
            api_version: api_version.to_string(),
        }
    }

    fn endpoint(&self, path: String, extra_headers: &[(String, String)]) -> Endpoint {
        extra_headers.iter().fold(
            Endpoint::new(path, HttpMethod::Post).with_query_param("api-version", &self.api_version),
            |endpoint, (key, value)| endpoint.with_header(key, value),
        )
    }

    /// Send a chat completion request
    pub(crate) async fn send_chat_request(
        &self,
        path: String,
        request: &ChatRequest,
        extra_headers: &[(String, String)],
    ) -> Result<ChatResponse, AzureOpenAIError> {
        let endpoint = self.endpoint(path, extra_headers);
        Ok(self
            .request_builder
            .request_json(&endpoint, Some(request))
            .await?)
    }

    /// Stream a chat completion request as raw body lines
    pub(crate) fn stream_chat_lines(
        &self,
        path: String,
        request: &ChatRequest,
        extra_headers: &[(String, String)],
    ) -> BoxStream<'static, Result<String, AzureOpenAIError>> {
        let endpoint = self.endpoint(path, extra_headers);
        self.request_builder
            .stream_lines(&endpoint, Some(request))
            .map(|line| line.map_err(AzureOpenAIError::from))
            .boxed()
    }

    /// Generate embeddings
    pub(crate) async fn create_embeddings(
        &self,
        deployment: &str,
        request: &EmbeddingsRequest,
    ) -> Result<EmbeddingsResponse, AzureOpenAIError> {
        let endpoint = self.endpoint(format!("deployments/{deployment}/embeddings"), &[]);
        Ok(self
            .request_builder
            .request_json(&endpoint, Some(request))
            .await?)
    }
}


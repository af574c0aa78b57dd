use relay_common::{AuthMethod, Endpoint, HttpMethod, RequestBuilder, RequestConfig};

use crate::{AzureSearchError, IndexDefinition, SearchRequest, SearchResponse};

/// First API version with vector fields
pub const DEFAULT_API_VERSION: &str = "2023-07-01-Preview";

/// `https://{service}.search.windows.net`
pub fn service_endpoint(service: &str) -> String {
    format!("https://{service}.search.windows.net")
}

/// Azure Cognitive Search client for one search service
#[derive(Debug, Clone)]
pub struct AzureSearch {
    request_builder: RequestBuilder,
    api_version: String,
}

impl AzureSearch {
    /// Create a client for a service endpoint with an admin or query key
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let config = RequestConfig::new(endpoint).with_auth(AuthMethod::ApiKey {
            header_name: "api-key".to_string(),
            key: api_key.into(),
        });

        Self {
            request_builder: RequestBuilder::new(reqwest::Client::new(), config),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.request_builder.config().base_url
    }

    fn endpoint_for(&self, path: String, method: HttpMethod) -> Endpoint {
        Endpoint::new(path, method).with_query_param("api-version", &self.api_version)
    }

    /// Create the index, or update it in place when it already exists
    pub async fn create_or_update_index(
        &self,
        index: &IndexDefinition,
    ) -> Result<(), AzureSearchError> {
        index.validate()?;
        log::info!("declaring search index {} on {}", index.name, self.endpoint());

        let endpoint = self.endpoint_for(format!("indexes/{}", index.name), HttpMethod::Put);
        self.request_builder
            .request_unit(&endpoint, Some(index))
            .await?;
        Ok(())
    }

    /// Run a query against an index
    pub async fn search(
        &self,
        index_name: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, AzureSearchError> {
        let endpoint = self.endpoint_for(
            format!("indexes/{index_name}/docs/search"),
            HttpMethod::Post,
        );
        Ok(self
            .request_builder
            .request_json(&endpoint, Some(request))
            .await?)
    }
}

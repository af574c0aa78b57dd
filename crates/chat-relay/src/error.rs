use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use azure_openai_ox::AzureOpenAIError;
use azure_search_ox::AzureSearchError;
use cosmos_ox::CosmosError;
use serde_json::json;
use thiserror::Error;

/// Failure of one of the hosted services the relay depends on
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("completion service: {0}")]
    Completion(#[from] AzureOpenAIError),

    #[error("search service: {0}")]
    Search(#[from] AzureSearchError),
}

/// Errors surfaced by the relay
#[derive(Debug, Error)]
pub enum RelayError {
    /// A setting is missing or malformed
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The completion, embedding or search service failed
    #[error("Upstream provider error: {0}")]
    UpstreamProvider(#[from] UpstreamError),

    /// The document store failed
    #[error("Persistence error: {0}")]
    Persistence(#[from] CosmosError),

    /// A streamed event or an inbound body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl RelayError {
    pub fn configuration(message: impl Into<String>) -> Self {
        RelayError::Configuration(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        RelayError::Parse(message.into())
    }

    /// `{"error": "<message>"}`
    pub fn to_json(&self) -> serde_json::Value {
        json!({ "error": self.to_string() })
    }
}

impl From<AzureOpenAIError> for RelayError {
    fn from(error: AzureOpenAIError) -> Self {
        RelayError::UpstreamProvider(error.into())
    }
}

impl From<AzureSearchError> for RelayError {
    fn from(error: AzureSearchError) -> Self {
        RelayError::UpstreamProvider(error.into())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        log::error!("{self}");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_body() {
        let error = RelayError::configuration("AZURE_OPENAI_TEMPERATURE is not set");
        assert_eq!(
            error.to_json(),
            json!({"error": "Configuration error: AZURE_OPENAI_TEMPERATURE is not set"})
        );
    }

    #[test]
    fn test_every_error_is_a_server_error() {
        let response = RelayError::parse("bad line").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

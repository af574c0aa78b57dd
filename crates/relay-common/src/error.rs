use thiserror::Error;

/// Common errors that can occur in outbound service requests
#[derive(Error, Debug)]
pub enum CommonRequestError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered with success but the body was not what we expected
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// UTF-8 conversion error
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(#[from] std::string::FromUtf8Error),
}

impl CommonRequestError {
    /// HTTP status reported by the remote service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            CommonRequestError::Api { status, .. } => Some(*status),
            CommonRequestError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Parse error response from HTTP status and body
pub fn parse_error_response(status: reqwest::StatusCode, body: &bytes::Bytes) -> CommonRequestError {
    let message = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|json| extract_error_message(&json))
        .unwrap_or_else(|| String::from_utf8_lossy(body).to_string());

    CommonRequestError::Api {
        status: status.as_u16(),
        message,
    }
}

/// Extract error message from the JSON error formats used by the Azure services
fn extract_error_message(json: &serde_json::Value) -> Option<String> {
    // Azure OpenAI / Cognitive Search: {"error": {"code": "...", "message": "..."}}
    if let Some(message) = json
        .get("error")
        .and_then(|error| error.get("message"))
        .and_then(serde_json::Value::as_str)
    {
        return Some(message.to_string());
    }

    // Cosmos DB: {"code": "...", "message": "..."}
    if let Some(message) = json.get("message").and_then(serde_json::Value::as_str) {
        return Some(message.to_string());
    }

    None
}

use relay_common::CommonRequestError;
use thiserror::Error;

/// Errors that can occur when talking to Cosmos DB
#[derive(Debug, Error)]
pub enum CosmosError {
    /// Transport, status or decoding failure
    #[error(transparent)]
    Request(#[from] CommonRequestError),

    /// The master key is not valid base64
    #[error("Invalid master key: {0}")]
    InvalidMasterKey(#[from] base64::DecodeError),

    /// An item could not be turned into a JSON document
    #[error("Invalid document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// The document has no value at the container's partition key path
    #[error("Document has no value at partition key path {path}")]
    MissingPartitionKey { path: String },
}

impl CosmosError {
    /// HTTP status reported by the service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            CosmosError::Request(e) => e.status(),
            _ => None,
        }
    }
}

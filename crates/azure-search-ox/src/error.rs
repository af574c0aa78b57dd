use relay_common::CommonRequestError;
use thiserror::Error;

/// Errors that can occur when talking to Azure Cognitive Search
#[derive(Debug, Error)]
pub enum AzureSearchError {
    /// Transport, status or decoding failure
    #[error(transparent)]
    Request(#[from] CommonRequestError),

    /// The index definition is not acceptable before it is even sent
    #[error("Invalid index definition: {0}")]
    InvalidIndex(String),
}

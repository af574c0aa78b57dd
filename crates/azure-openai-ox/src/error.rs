use relay_common::CommonRequestError;
use thiserror::Error;

/// Errors that can occur when making requests to Azure OpenAI
#[derive(Debug, Error)]
pub enum AzureOpenAIError {
    /// Transport, status or decoding failure
    #[error(transparent)]
    Request(#[from] CommonRequestError),

    /// The embeddings endpoint answered without a vector
    #[error("Embedding response contained no vectors")]
    EmptyEmbedding,
}

impl AzureOpenAIError {
    /// HTTP status reported by the service, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AzureOpenAIError::Request(e) => e.status(),
            AzureOpenAIError::EmptyEmbedding => None,
        }
    }
}

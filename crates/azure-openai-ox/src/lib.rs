//! Azure OpenAI client for Rust
//!
//! Covers the parts of the Azure OpenAI service the relay needs:
//! - Chat completions on a deployment, blocking or streamed line by line
//! - The `extensions` chat endpoint that grounds answers in an Azure
//!   Cognitive Search index ("on your data")
//! - Text embeddings
//!
//! # Example
//!
//! ```rust,no_run
//! use azure_openai_ox::{AzureOpenAI, ChatMessage, ChatRequest, Target};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AzureOpenAI::new("my-resource", "gpt-35-turbo", "your-api-key", "2023-06-01-preview");
//!
//!     let request = ChatRequest::builder()
//!         .message(ChatMessage::user("Hello, world!"))
//!         .temperature(0.0)
//!         .build();
//!
//!     let response = client.send(Target::ChatCompletions, &request, &[]).await?;
//!     println!("{}", response.content().unwrap_or("No content"));
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
mod internal;
pub mod message;
pub mod model;
pub mod request;
pub mod response;
pub mod usage;

pub use client::{AzureOpenAI, resource_url};
pub use error::AzureOpenAIError;
pub use message::{ChatMessage, Role};
pub use model::{CHATGPT_URL_API_VERSION, ModelFamily};
pub use request::{
    ChatRequest, DataSource, EmbeddingsRequest, FieldsMapping, QueryType,
    SearchParameters, Target,
};
pub use response::{
    ChatChunk, ChatResponse, Choice, ChunkChoice, EmbeddingData, EmbeddingsResponse,
    ResponseMessage,
};
pub use usage::Usage;

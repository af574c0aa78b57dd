#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(clippy::pedantic, clippy::unwrap_used)]

//! Chat relay server
//!
//! Forwards chat requests from a web client to an Azure OpenAI deployment,
//! optionally grounded in an Azure Cognitive Search index, and keeps
//! conversation transcripts in Cosmos DB.
//!
//! Streamed answers are folded by the [`reassembler`] into a snapshot of the
//! whole answer, sent after every upstream event as one JSON line.

pub mod completion;
pub mod config;
pub mod error;
pub mod reassembler;
pub mod retrieval;
pub mod routes;
pub mod store;
pub mod translator;

pub use completion::{CompletionReply, CompletionService, reshape};
pub use config::{Settings, StreamErrorPolicy};
pub use error::{RelayError, UpstreamError};
pub use reassembler::{AggregateResponse, Reassembler, StreamEvent, decode_line, reassemble};
pub use retrieval::{AzureEmbedder, Embedder, RetrievalIndexer};
pub use routes::{AppState, router};
pub use store::{
    Conversation, ConversationStore, CosmosConversationStore, HistoryRequest,
    InMemoryConversationStore, SaveRequest, strip_citations,
};
pub use translator::{InboundChat, RequestTranslator, TranslatedRequest};

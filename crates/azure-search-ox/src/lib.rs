//! Azure Cognitive Search client
//!
//! Index definitions (field schema plus vector search configuration) and
//! vector similarity queries over the REST API.

pub mod client;
pub mod error;
pub mod index;
pub mod search;

pub use client::{AzureSearch, DEFAULT_API_VERSION, service_endpoint};
pub use error::AzureSearchError;
pub use index::{FieldType, IndexDefinition, SearchField, VectorSearch};
pub use search::{SearchDocument, SearchRequest, SearchResponse, VectorQuery};

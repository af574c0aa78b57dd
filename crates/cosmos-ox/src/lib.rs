//! Azure Cosmos DB (SQL API) client
//!
//! A small REST client covering what a document-per-record store needs:
//! master-key request signing, parameterised queries (optionally across
//! partitions, following continuation tokens) and document creation.
//!
//! # Example
//!
//! ```rust,no_run
//! use cosmos_ox::{CosmosClient, Query};
//! use serde_json::Value;
//!
//! # async fn run() -> Result<(), cosmos_ox::CosmosError> {
//! let container = CosmosClient::new("https://acct.documents.azure.com:443/", "bWFzdGVy")?
//!     .database("chats")
//!     .container("conversations");
//!
//! let query = Query::new("SELECT * FROM r WHERE r.user=@user").with_parameter("@user", "u1");
//! let items: Vec<Value> = container.query_items(&query, true).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod query;

pub use auth::{MasterKey, ResourceType};
pub use client::{ContainerClient, CosmosClient, DatabaseClient};
pub use error::CosmosError;
pub use query::{ContainerProperties, PartitionKeyDefinition, Query, QueryParameter};

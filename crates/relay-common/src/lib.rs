#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Shared HTTP client plumbing for the chat-relay service crates
//!
//! Every remote service the relay talks to (completion provider, search
//! index, document store) goes through the same [`RequestBuilder`], reports
//! failures as [`CommonRequestError`] and, where it streams, is read line by
//! line with [`LineDecoder`].

pub mod error;
pub mod request_builder;
pub mod streaming;

pub use error::CommonRequestError;
pub use request_builder::{AuthMethod, Endpoint, HttpMethod, RequestBuilder, RequestConfig};
pub use streaming::LineDecoder;

/// Re-export common types for convenience
pub use futures_util::stream::BoxStream;
pub use serde::{Deserialize, Serialize};

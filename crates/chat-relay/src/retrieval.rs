//! Vector index over the document corpus
//!
//! Not on the completion path; reached through `chat-relay search`.

use async_trait::async_trait;
use azure_openai_ox::AzureOpenAI;
use azure_search_ox::{
    AzureSearch, IndexDefinition, SearchDocument, SearchField, SearchRequest, VectorQuery,
    VectorSearch,
};

use crate::RelayError;

/// Embedded to learn the vector size
pub const PROBE_TEXT: &str = "Text";
/// Hits returned per query
pub const SEARCH_K: usize = 3;
pub const VECTOR_FIELD: &str = "content_vector";
pub const VECTOR_CONFIGURATION: &str = "default";

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RelayError>;
}

/// Embeddings from an Azure OpenAI embedding deployment
#[derive(Debug, Clone)]
pub struct AzureEmbedder {
    client: AzureOpenAI,
    deployment: String,
}

impl AzureEmbedder {
    pub fn new(client: AzureOpenAI, deployment: impl Into<String>) -> Self {
        Self {
            client,
            deployment: deployment.into(),
        }
    }
}

#[async_trait]
impl Embedder for AzureEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RelayError> {
        Ok(self.client.embed(&self.deployment, text).await?)
    }
}

/// The fixed document schema with a vector field of `dimensions` floats
pub fn schema(index_name: &str, dimensions: usize) -> IndexDefinition {
    IndexDefinition::new(
        index_name,
        vec![
            SearchField::key("id"),
            SearchField::searchable("content"),
            SearchField::vector(VECTOR_FIELD, dimensions, VECTOR_CONFIGURATION),
            SearchField::searchable("metadata"),
            SearchField::searchable("title"),
            SearchField::simple("source"),
        ],
    )
    .with_vector_search(VectorSearch::hnsw(VECTOR_CONFIGURATION))
}

pub struct RetrievalIndexer<E> {
    search: AzureSearch,
    index_name: String,
    embedder: E,
    dimensions: usize,
}

impl<E: Embedder> RetrievalIndexer<E> {
    /// Probe the embedding size and declare the index
    pub async fn initialise(
        search: AzureSearch,
        index_name: impl Into<String>,
        embedder: E,
    ) -> Result<Self, RelayError> {
        let index_name = index_name.into();
        let dimensions = embedder.embed(PROBE_TEXT).await?.len();
        log::info!("embedding size {dimensions} for index {index_name}");

        search
            .create_or_update_index(&schema(&index_name, dimensions))
            .await?;

        Ok(Self {
            search,
            index_name,
            embedder,
            dimensions,
        })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The `SEARCH_K` documents closest to `query`
    pub async fn similarity_search(&self, query: &str) -> Result<Vec<SearchDocument>, RelayError> {
        let vector = self.embedder.embed(query).await?;
        let request = SearchRequest::builder()
            .vectors(vec![VectorQuery {
                value: vector,
                fields: VECTOR_FIELD.to_string(),
                k: SEARCH_K,
            }])
            .top(SEARCH_K)
            .build();

        let mut hits = self.search.search(&self.index_name, &request).await?.value;
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(SEARCH_K);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use azure_search_ox::FieldType;

    #[test]
    fn test_schema() {
        let schema = schema("docs", 1536);

        let names: Vec<&str> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "content", "content_vector", "metadata", "title", "source"]);

        let id = schema.field("id").unwrap();
        assert!(id.key && id.filterable);

        let vector = schema.field("content_vector").unwrap();
        assert_eq!(vector.field_type, FieldType::SingleCollection);
        assert!(vector.searchable);
        assert_eq!(vector.dimensions, Some(1536));
        assert_eq!(vector.vector_search_configuration.as_deref(), Some("default"));

        assert!(schema.field("source").unwrap().filterable);
        assert!(schema.validate().is_ok());
    }
}

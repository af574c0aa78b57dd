use serde::{Deserialize, Serialize};

use crate::AzureSearchError;

/// Entity data model type of an index field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "Edm.String")]
    String,
    #[serde(rename = "Collection(Edm.Single)")]
    SingleCollection,
}

/// One field of an index definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_search_configuration: Option<String>,
}

impl SearchField {
    fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            key: false,
            searchable: false,
            filterable: false,
            dimensions: None,
            vector_search_configuration: None,
        }
    }

    /// Filterable, non-searchable string
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            filterable: true,
            ..Self::new(name, FieldType::String)
        }
    }

    /// The document key
    pub fn key(name: impl Into<String>) -> Self {
        Self {
            key: true,
            ..Self::simple(name)
        }
    }

    /// Full-text searchable string
    pub fn searchable(name: impl Into<String>) -> Self {
        Self {
            searchable: true,
            ..Self::new(name, FieldType::String)
        }
    }

    /// Vector of `dimensions` single-precision floats
    pub fn vector(
        name: impl Into<String>,
        dimensions: usize,
        configuration: impl Into<String>,
    ) -> Self {
        Self {
            searchable: true,
            dimensions: Some(dimensions),
            vector_search_configuration: Some(configuration.into()),
            ..Self::new(name, FieldType::SingleCollection)
        }
    }
}

/// Vector search section of an index definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorSearch {
    pub algorithm_configurations: Vec<serde_json::Value>,
}

impl VectorSearch {
    /// A single HNSW configuration with cosine distance
    pub fn hnsw(name: impl Into<String>) -> Self {
        Self {
            algorithm_configurations: vec![serde_json::json!({
                "name": name.into(),
                "kind": "hnsw",
                "hnswParameters": {
                    "m": 4,
                    "efConstruction": 400,
                    "efSearch": 500,
                    "metric": "cosine"
                }
            })],
        }
    }
}

/// A complete index definition as accepted by `PUT /indexes/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<SearchField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_search: Option<VectorSearch>,
}

impl IndexDefinition {
    pub fn new(name: impl Into<String>, fields: Vec<SearchField>) -> Self {
        Self {
            name: name.into(),
            fields,
            vector_search: None,
        }
    }

    #[must_use]
    pub fn with_vector_search(mut self, vector_search: VectorSearch) -> Self {
        self.vector_search = Some(vector_search);
        self
    }

    pub fn field(&self, name: &str) -> Option<&SearchField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Exactly one key field, and every vector field has a non-zero size
    pub fn validate(&self) -> Result<(), AzureSearchError> {
        let keys = self.fields.iter().filter(|field| field.key).count();
        if keys != 1 {
            return Err(AzureSearchError::InvalidIndex(format!(
                "index {} must have exactly one key field, found {keys}",
                self.name
            )));
        }

        if let Some(field) = self
            .fields
            .iter()
            .find(|field| field.field_type == FieldType::SingleCollection && field.dimensions.unwrap_or(0) == 0)
        {
            return Err(AzureSearchError::InvalidIndex(format!(
                "vector field {} has no dimensions",
                field.name
            )));
        }

        Ok(())
    }
}

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A vector query against one vector field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQuery {
    pub value: Vec<f32>,
    /// Comma-separated vector field names
    pub fields: String,
    pub k: usize,
}

/// Body of `POST /indexes/{name}/docs/search`
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct SearchRequest {
    /// Full-text query; `None` for a pure vector query
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub search: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default)]
    pub vectors: Vec<VectorQuery>,

    /// Comma-separated fields to return
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(into)]
    pub select: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

/// One hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    #[serde(rename = "@search.score")]
    pub score: f64,

    /// Every other returned field
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SearchDocument {
    /// A string field of the hit
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub value: Vec<SearchDocument>,
}

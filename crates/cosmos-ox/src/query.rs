use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameterised SQL query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub query: String,
    pub parameters: Vec<QueryParameter>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

impl Query {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// One page of query results
#[derive(Debug, Deserialize)]
pub(crate) struct QueryPage<T> {
    #[serde(rename = "Documents")]
    pub documents: Vec<T>,
}

/// Subset of a container resource
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    pub id: String,
    #[serde(default)]
    pub partition_key: Option<PartitionKeyDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PartitionKeyDefinition {
    pub paths: Vec<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl PartitionKeyDefinition {
    /// Value of the partition key in `document`, by walking the first path
    /// (`/user` or `/a/b`) segment by segment
    pub fn extract<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let path = self.paths.first()?;
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(document, |current, segment| current.get(segment))
    }
}

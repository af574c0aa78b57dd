//! Process settings
//!
//! The environment is read exactly once, at startup, into an immutable
//! [`Settings`] value that is handed to every component.

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use azure_openai_ox::{FieldsMapping, QueryType, resource_url};
use azure_search_ox::service_endpoint;

use crate::RelayError;

const DEFAULT_PREVIEW_API_VERSION: &str = "2023-06-01-preview";
const DEFAULT_EMBEDDING_DEPLOYMENT: &str = "text-embedding-ada-002";
const DEFAULT_SEMANTIC_CONFIG: &str = "default";
const DEFAULT_TOP_K: u32 = 5;
const DEFAULT_STATIC_DIR: &str = "static";

/// What the reassembler does after forwarding an upstream error event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamErrorPolicy {
    /// End the stream after the error frame
    #[default]
    Terminate,
    /// Keep folding the events that follow
    Continue,
}

impl FromStr for StreamErrorPolicy {
    type Err = RelayError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "terminate" => Ok(StreamErrorPolicy::Terminate),
            "continue" => Ok(StreamErrorPolicy::Continue),
            other => Err(RelayError::configuration(format!(
                "RELAY_STREAM_ERROR_POLICY must be `terminate` or `continue`, got `{other}`"
            ))),
        }
    }
}

/// Azure Cognitive Search, present only when service, index and key are all set
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub service: String,
    pub index: String,
    pub key: String,
    /// `AZURE_SEARCH_SERVICE_ENDPOINT`, or derived from the service name
    pub endpoint: String,
    pub use_semantic_search: bool,
    pub semantic_search_config: String,
    pub top_k: u32,
    pub enable_in_domain: bool,
    pub fields: FieldsMapping,
}

impl SearchSettings {
    pub fn query_type(&self) -> QueryType {
        if self.use_semantic_search {
            QueryType::Semantic
        } else {
            QueryType::Simple
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAISettings {
    pub resource: Option<String>,
    /// Deployment name
    pub model: Option<String>,
    pub key: Option<String>,
    pub model_name: Option<String>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop_sequence: Option<Vec<String>>,
    pub system_message: Option<String>,
    pub preview_api_version: String,
    pub stream: bool,
    pub embedding_deployment: String,
}

impl OpenAISettings {
    /// Resource, deployment and key, or the names of the missing variables
    pub fn credentials(&self) -> Result<(&str, &str, &str), RelayError> {
        match (&self.resource, &self.model, &self.key) {
            (Some(resource), Some(model), Some(key)) => Ok((resource, model, key)),
            _ => Err(RelayError::configuration(
                "AZURE_OPENAI_RESOURCE, AZURE_OPENAI_MODEL and AZURE_OPENAI_KEY must be set",
            )),
        }
    }

    /// `https://{resource}.openai.azure.com/openai/deployments/{model}`
    pub fn deployment_url(&self) -> Result<String, RelayError> {
        let (resource, model, _) = self.credentials()?;
        Ok(format!("{}/deployments/{model}", resource_url(resource)))
    }
}

/// Cosmos DB, present only when all four variables are set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CosmosSettings {
    pub host: String,
    pub master_key: String,
    pub database_id: String,
    pub container_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    pub static_dir: PathBuf,
    pub stream_error_policy: StreamErrorPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub search: Option<SearchSettings>,
    pub openai: OpenAISettings,
    pub cosmos: Option<CosmosSettings>,
    pub server: ServerSettings,
}

impl Settings {
    /// Read the process environment
    pub fn from_env() -> Result<Self, RelayError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve settings through `lookup`; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RelayError> {
        let env = Env(lookup);

        let search = match (
            env.get("AZURE_SEARCH_SERVICE"),
            env.get("AZURE_SEARCH_INDEX"),
            env.get("AZURE_SEARCH_KEY"),
        ) {
            (Some(service), Some(index), Some(key)) => Some(SearchSettings {
                endpoint: env
                    .get("AZURE_SEARCH_SERVICE_ENDPOINT")
                    .unwrap_or_else(|| service_endpoint(&service)),
                service,
                index,
                key,
                use_semantic_search: env.flag("AZURE_SEARCH_USE_SEMANTIC_SEARCH", false),
                semantic_search_config: env
                    .get("AZURE_SEARCH_SEMANTIC_SEARCH_CONFIG")
                    .unwrap_or_else(|| DEFAULT_SEMANTIC_CONFIG.to_string()),
                top_k: env
                    .number("AZURE_SEARCH_TOP_K")?
                    .unwrap_or(DEFAULT_TOP_K),
                enable_in_domain: env.flag("AZURE_SEARCH_ENABLE_IN_DOMAIN", true),
                fields: FieldsMapping {
                    content_field: env.list("AZURE_SEARCH_CONTENT_COLUMNS").unwrap_or_default(),
                    title_field: env.get("AZURE_SEARCH_TITLE_COLUMN"),
                    url_field: env.get("AZURE_SEARCH_URL_COLUMN"),
                    filepath_field: env.get("AZURE_SEARCH_FILENAME_COLUMN"),
                },
            }),
            _ => None,
        };

        let openai = OpenAISettings {
            resource: env.get("AZURE_OPENAI_RESOURCE"),
            model: env.get("AZURE_OPENAI_MODEL"),
            key: env.get("AZURE_OPENAI_KEY"),
            model_name: env.get("AZURE_OPENAI_MODEL_NAME"),
            temperature: env.number("AZURE_OPENAI_TEMPERATURE")?,
            top_p: env.number("AZURE_OPENAI_TOP_P")?,
            max_tokens: env.number("AZURE_OPENAI_MAX_TOKENS")?,
            stop_sequence: env.list("AZURE_OPENAI_STOP_SEQUENCE"),
            system_message: env.get("AZURE_OPENAI_SYSTEM_MESSAGE"),
            preview_api_version: env
                .get("AZURE_OPENAI_PREVIEW_API_VERSION")
                .unwrap_or_else(|| DEFAULT_PREVIEW_API_VERSION.to_string()),
            stream: env.flag("AZURE_OPENAI_STREAM", true),
            embedding_deployment: env
                .get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_DEPLOYMENT.to_string()),
        };

        let cosmos = match (
            env.get("HOST"),
            env.get("MASTER_KEY"),
            env.get("DATABASE_ID"),
            env.get("CONTAINER_ID"),
        ) {
            (Some(host), Some(master_key), Some(database_id), Some(container_id)) => {
                Some(CosmosSettings {
                    host,
                    master_key,
                    database_id,
                    container_id,
                })
            }
            _ => None,
        };

        let server = ServerSettings {
            bind: env
                .number("RELAY_BIND")?
                .unwrap_or_else(default_bind),
            static_dir: env
                .get("RELAY_STATIC_DIR")
                .unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string())
                .into(),
            stream_error_policy: env
                .get("RELAY_STREAM_ERROR_POLICY")
                .map(|value| value.parse())
                .transpose()?
                .unwrap_or_default(),
        };

        Ok(Settings {
            search,
            openai,
            cosmos,
            server,
        })
    }

    /// Retrieval augmentation is on when the search service is configured
    pub fn augmented(&self) -> bool {
        self.search.is_some()
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: DEFAULT_STATIC_DIR.into(),
            stream_error_policy: StreamErrorPolicy::default(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}

/// Typed access over a variable lookup
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn flag(&self, name: &str, default: bool) -> bool {
        self.get(name)
            .map_or(default, |value| value.trim().eq_ignore_ascii_case("true"))
    }

    fn number<T: FromStr>(&self, name: &str) -> Result<Option<T>, RelayError> {
        self.get(name)
            .map(|value| {
                value.trim().parse().map_err(|_| {
                    RelayError::configuration(format!("{name} has an invalid value `{value}`"))
                })
            })
            .transpose()
    }

    /// `a|b|c`
    fn list(&self, name: &str) -> Option<Vec<String>> {
        self.get(name)
            .map(|value| value.split('|').map(str::to_string).collect())
    }
}

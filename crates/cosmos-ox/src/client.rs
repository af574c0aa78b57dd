use chrono::Utc;
use relay_common::{Endpoint, HttpMethod, RequestBuilder, RequestConfig};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    ContainerProperties, CosmosError, MasterKey, Query, ResourceType,
    auth::http_date,
    query::QueryPage,
};

/// REST API version the client speaks
pub const API_VERSION: &str = "2018-12-31";

const CONTINUATION_HEADER: &str = "x-ms-continuation";

/// Account-level client
#[derive(Debug, Clone)]
pub struct CosmosClient {
    request_builder: RequestBuilder,
    key: MasterKey,
}

impl CosmosClient {
    /// `host` is the account endpoint, e.g. `https://acct.documents.azure.com:443/`
    pub fn new(host: impl Into<String>, master_key: &str) -> Result<Self, CosmosError> {
        let config = RequestConfig::new(host)
            .with_header("x-ms-version", API_VERSION)
            .with_user_agent(concat!("cosmos-ox/", env!("CARGO_PKG_VERSION")));

        Ok(Self {
            request_builder: RequestBuilder::new(reqwest::Client::new(), config),
            key: MasterKey::from_base64(master_key)?,
        })
    }

    pub fn host(&self) -> &str {
        &self.request_builder.config().base_url
    }

    pub fn database(&self, id: impl Into<String>) -> DatabaseClient {
        DatabaseClient {
            client: self.clone(),
            id: id.into(),
        }
    }

    /// Endpoint carrying a fresh date and signature
    fn signed(
        &self,
        path: String,
        method: HttpMethod,
        resource_type: ResourceType,
        resource_link: &str,
    ) -> Endpoint {
        let verb = match method {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
        };
        let date = http_date(Utc::now());
        let authorization = self.key.authorization(verb, resource_type, resource_link, &date);

        Endpoint::new(path, method)
            .with_header("authorization", authorization)
            .with_header("x-ms-date", date)
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseClient {
    client: CosmosClient,
    id: String,
}

impl DatabaseClient {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn container(&self, id: impl Into<String>) -> ContainerClient {
        ContainerClient {
            client: self.client.clone(),
            link: format!("dbs/{}/colls/{}", self.id, id.into()),
        }
    }
}

/// Client for the documents of one container
#[derive(Debug, Clone)]
pub struct ContainerClient {
    client: CosmosClient,
    link: String,
}

impl ContainerClient {
    /// `dbs/{db}/colls/{container}`
    pub fn link(&self) -> &str {
        &self.link
    }

    pub async fn read_properties(&self) -> Result<ContainerProperties, CosmosError> {
        let endpoint = self.client.signed(
            self.link.clone(),
            HttpMethod::Get,
            ResourceType::Colls,
            &self.link,
        );
        Ok(self
            .client
            .request_builder
            .request_json(&endpoint, None::<&()>)
            .await?)
    }

    /// Run a query and collect every page of results
    pub async fn query_items<T: DeserializeOwned>(
        &self,
        query: &Query,
        cross_partition: bool,
    ) -> Result<Vec<T>, CosmosError> {
        let mut items = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut endpoint = self
                .client
                .signed(
                    format!("{}/docs", self.link),
                    HttpMethod::Post,
                    ResourceType::Docs,
                    &self.link,
                )
                .with_header("x-ms-documentdb-isquery", "True")
                .with_header("content-type", "application/query+json");
            if cross_partition {
                endpoint =
                    endpoint.with_header("x-ms-documentdb-query-enablecrosspartition", "True");
            }
            if let Some(token) = continuation.take() {
                endpoint = endpoint.with_header(CONTINUATION_HEADER, token);
            }

            let (page, headers): (QueryPage<T>, _) = self
                .client
                .request_builder
                .request_json_with_headers(&endpoint, Some(query))
                .await?;
            items.extend(page.documents);

            continuation = headers
                .get(CONTINUATION_HEADER)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            if continuation.is_none() {
                break;
            }
            log::debug!("following continuation on {}", self.link);
        }

        Ok(items)
    }

    /// Insert a new document and return the stored resource
    ///
    /// The partition key value is read from the document at the path the
    /// container declares.
    pub async fn create_item<T: Serialize>(&self, item: &T) -> Result<Value, CosmosError> {
        let document = serde_json::to_value(item)?;
        let properties = self.read_properties().await?;

        let mut endpoint = self.client.signed(
            format!("{}/docs", self.link),
            HttpMethod::Post,
            ResourceType::Docs,
            &self.link,
        );
        if let Some(definition) = properties.partition_key {
            let value = definition.extract(&document).ok_or_else(|| {
                CosmosError::MissingPartitionKey {
                    path: definition.paths.first().cloned().unwrap_or_default(),
                }
            })?;
            endpoint = endpoint.with_header(
                "x-ms-documentdb-partitionkey",
                serde_json::to_string(&[value])?,
            );
        }

        Ok(self
            .client
            .request_builder
            .request_json(&endpoint, Some(&document))
            .await?)
    }
}

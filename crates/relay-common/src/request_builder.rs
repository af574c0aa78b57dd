use crate::{
    error::{self, CommonRequestError},
    streaming::LineDecoder,
};
use async_stream::try_stream;
use futures_util::{StreamExt, stream::BoxStream};
use reqwest::{Method, RequestBuilder as ReqwestRequestBuilder, Response, header::HeaderMap};
use serde::{Deserialize, Serialize};

/// HTTP method for API endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
        }
    }
}

/// Authentication method for API requests
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Static key sent in a named header (e.g. `api-key: <key>`)
    ApiKey { header_name: String, key: String },
}

/// Represents an API endpoint with its configuration
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub path: String,
    pub method: HttpMethod,
    pub extra_headers: Vec<(String, String)>,
    pub query_params: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            extra_headers: Vec::new(),
            query_params: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.push((key.into(), value.into()));
        self
    }

    /// Whether the endpoint sets its own content type
    fn has_content_type(&self) -> bool {
        self.extra_headers
            .iter()
            .any(|(key, _)| key.eq_ignore_ascii_case("content-type"))
    }
}

/// Configuration for request building
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub base_url: String,
    pub auth: Option<AuthMethod>,
    pub default_headers: Vec<(String, String)>,
    pub user_agent: Option<String>,
}

impl RequestConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            default_headers: Vec::new(),
            user_agent: None,
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: AuthMethod) -> Self {
        self.auth = Some(auth);
        self
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Generic request builder that handles common HTTP patterns
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    client: reqwest::Client,
    config: RequestConfig,
}

impl RequestBuilder {
    pub fn new(client: reqwest::Client, config: RequestConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Full URL for an endpoint, without query parameters
    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.path.trim_start_matches('/')
        )
    }

    /// Build a reqwest RequestBuilder for the given endpoint
    pub fn build_request(&self, endpoint: &Endpoint) -> ReqwestRequestBuilder {
        let url = self.url(endpoint);
        let method: Method = endpoint.method.into();

        let mut req = self.client.request(method, &url);

        if !endpoint.query_params.is_empty() {
            req = req.query(&endpoint.query_params);
        }

        if let Some(ref auth) = self.config.auth {
            req = match auth {
                AuthMethod::ApiKey { header_name, key } => req.header(header_name, key),
            };
        }

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        for (key, value) in &endpoint.extra_headers {
            req = req.header(key, value);
        }

        if let Some(ref user_agent) = self.config.user_agent {
            req = req.header("user-agent", user_agent);
        }

        // JSON unless the endpoint brought its own content type
        if !endpoint.has_content_type()
            && matches!(endpoint.method, HttpMethod::Post | HttpMethod::Put)
        {
            req = req.header("content-type", "application/json");
        }

        req
    }

    /// Serialize the body once so the debug log and the wire see the same payload
    fn attach_body<B: Serialize>(
        endpoint: &Endpoint,
        req: ReqwestRequestBuilder,
        body: Option<&B>,
    ) -> Result<ReqwestRequestBuilder, CommonRequestError> {
        let Some(body) = body else {
            return Ok(req);
        };
        let payload = serde_json::to_vec(body)?;
        log::debug!(
            "{:?} {} payload: {}",
            endpoint.method,
            endpoint.path,
            String::from_utf8_lossy(&payload)
        );
        Ok(req.body(payload))
    }

    /// Execute a request with an optional JSON body and return the deserialized response
    pub async fn request_json<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> Result<T, CommonRequestError> {
        let (value, _) = self.request_json_with_headers(endpoint, body).await?;
        Ok(value)
    }

    /// Like [`RequestBuilder::request_json`] but also hands back the response headers
    pub async fn request_json_with_headers<T: for<'de> Deserialize<'de>, B: Serialize>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> Result<(T, HeaderMap), CommonRequestError> {
        let req = Self::attach_body(endpoint, self.build_request(endpoint), body)?;
        let res = req.send().await?;
        let headers = res.headers().clone();
        let value = self.handle_response(res).await?;
        Ok((value, headers))
    }

    /// Execute a request and discard the response body
    pub async fn request_unit<B: Serialize>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> Result<(), CommonRequestError> {
        let req = Self::attach_body(endpoint, self.build_request(endpoint), body)?;
        let res = req.send().await?;

        if res.status().is_success() {
            Ok(())
        } else {
            let status = res.status();
            let bytes = res.bytes().await?;
            Err(error::parse_error_response(status, &bytes))
        }
    }

    /// Execute a streaming request and yield every non-empty line of the body
    ///
    /// Lines are handed over verbatim (minus the line terminator); framing
    /// markers such as `data:` are left for the caller to interpret.
    pub fn stream_lines<B: Serialize>(
        &self,
        endpoint: &Endpoint,
        body: Option<&B>,
    ) -> BoxStream<'static, Result<String, CommonRequestError>> {
        let req = Self::attach_body(endpoint, self.build_request(endpoint), body);

        Box::pin(try_stream! {
            let response = req?.send().await?;
            let status = response.status();

            if !status.is_success() {
                let bytes = response.bytes().await?;
                Err(error::parse_error_response(status, &bytes))?;
            } else {
                let mut byte_stream = response.bytes_stream();
                let mut decoder = LineDecoder::new();

                while let Some(chunk) = byte_stream.next().await {
                    decoder.push(&chunk?);
                    while let Some(line) = decoder.next_line()? {
                        if !line.trim().is_empty() {
                            yield line;
                        }
                    }
                }

                if let Some(line) = decoder.finish()? {
                    if !line.trim().is_empty() {
                        yield line;
                    }
                }
            }
        })
    }

    /// Handle response and parse errors
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        res: Response,
    ) -> Result<T, CommonRequestError> {
        let status = res.status();
        let bytes = res.bytes().await?;

        if status.is_success() {
            serde_json::from_slice::<T>(&bytes).map_err(|e| {
                let body_str = String::from_utf8_lossy(&bytes);
                CommonRequestError::UnexpectedResponse(format!(
                    "HTTP {} but failed to decode JSON: {}; body: {}",
                    status.as_u16(),
                    e,
                    body_str
                ))
            })
        } else {
            Err(error::parse_error_response(status, &bytes))
        }
    }
}

use futures_util::StreamExt;
use relay_common::{
    AuthMethod, CommonRequestError, Endpoint, HttpMethod, RequestBuilder, RequestConfig,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

fn builder(base_url: &str) -> RequestBuilder {
    let config = RequestConfig::new(base_url)
        .with_auth(AuthMethod::ApiKey {
            header_name: "api-key".to_string(),
            key: "secret".to_string(),
        })
        .with_user_agent("relay-test/1.0");
    RequestBuilder::new(reqwest::Client::new(), config)
}

#[test]
fn test_endpoint_creation() {
    let endpoint = Endpoint::new("chat/completions", HttpMethod::Post)
        .with_query_param("api-version", "2023-06-01-preview")
        .with_header("chatgpt_url", "https://example.com");

    assert_eq!(endpoint.path, "chat/completions");
    assert_eq!(endpoint.method, HttpMethod::Post);
    assert_eq!(endpoint.query_params.len(), 1);
    assert_eq!(endpoint.extra_headers[0].0, "chatgpt_url");
}

#[test]
fn test_url_joins_without_double_slash() {
    let builder = builder("https://example.com/openai/");
    let endpoint = Endpoint::new("/deployments/chat/chat/completions", HttpMethod::Post);
    assert_eq!(
        builder.url(&endpoint),
        "https://example.com/openai/deployments/chat/chat/completions"
    );
}

#[tokio::test]
async fn test_request_json_sends_auth_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/docs/search"))
        .and(query_param("api-version", "2023-07-01-Preview"))
        .and(header("api-key", "secret"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"search": "*"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": []})))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("indexes/docs/search", HttpMethod::Post)
        .with_query_param("api-version", "2023-07-01-Preview");
    let response: Value = builder(&server.uri())
        .request_json(&endpoint, Some(&json!({"search": "*"})))
        .await
        .unwrap();

    assert_eq!(response, json!({"value": []}));
}

#[tokio::test]
async fn test_endpoint_content_type_overrides_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/docs"))
        .and(header("content-type", "application/query+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Documents": []})))
        .expect(1)
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("docs", HttpMethod::Post)
        .with_header("content-type", "application/query+json");
    let _: Value = builder(&server.uri())
        .request_json(&endpoint, Some(&json!({"query": "SELECT * FROM r"})))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_error_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"error": {"code": "NotFound", "message": "no such index"}})),
        )
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("missing", HttpMethod::Get);
    let err = builder(&server.uri())
        .request_json::<Value, ()>(&endpoint, None)
        .await
        .unwrap_err();

    match err {
        CommonRequestError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "no such index");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_success_with_bad_json_is_unexpected_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("garbage", HttpMethod::Get);
    let err = builder(&server.uri())
        .request_json::<Value, ()>(&endpoint, None)
        .await
        .unwrap_err();

    assert!(matches!(err, CommonRequestError::UnexpectedResponse(_)));
}

#[tokio::test]
async fn test_stream_lines_skips_blank_lines() {
    let server = MockServer::start().await;
    let body = "data: {\"n\":1}\n\ndata: {\"n\":2}\r\n\r\ndata: {\"n\":3}";
    Mock::given(method("POST"))
        .and(path("/stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("stream", HttpMethod::Post);
    let lines: Vec<String> = builder(&server.uri())
        .stream_lines(&endpoint, Some(&json!({"stream": true})))
        .map(|line| line.unwrap())
        .collect()
        .await;

    assert_eq!(
        lines,
        vec!["data: {\"n\":1}", "data: {\"n\":2}", "data: {\"n\":3}"]
    );
}

#[tokio::test]
async fn test_stream_lines_surfaces_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/stream"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"error": {"code": "429", "message": "Rate limit is exceeded."}})),
        )
        .mount(&server)
        .await;

    let endpoint = Endpoint::new("stream", HttpMethod::Post);
    let mut stream = builder(&server.uri()).stream_lines(&endpoint, Some(&json!({})));

    let first = stream.next().await.expect("stream should yield the error");
    assert_eq!(
        first.unwrap_err().to_string(),
        "HTTP 429: Rate limit is exceeded."
    );
    assert!(stream.next().await.is_none());
}

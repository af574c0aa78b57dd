use cosmos_ox::{CosmosClient, CosmosError, Query};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, header_exists, method, path},
};

const KEY: &str = "c2VjcmV0LWtleQ==";

fn container(server: &MockServer) -> cosmos_ox::ContainerClient {
    CosmosClient::new(server.uri(), KEY)
        .unwrap()
        .database("db")
        .container("conversations")
}

#[test]
fn test_invalid_master_key() {
    let err = CosmosClient::new("http://localhost", "%%%").unwrap_err();
    assert!(matches!(err, CosmosError::InvalidMasterKey(_)));
}

#[tokio::test]
async fn test_query_follows_continuation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/dbs/db/colls/conversations/docs"))
        .and(header("x-ms-continuation", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Documents": [{"id": "b"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/dbs/db/colls/conversations/docs"))
        .and(header("x-ms-documentdb-isquery", "True"))
        .and(header("x-ms-documentdb-query-enablecrosspartition", "True"))
        .and(header("content-type", "application/query+json"))
        .and(header("x-ms-version", "2018-12-31"))
        .and(header_exists("authorization"))
        .and(header_exists("x-ms-date"))
        .and(body_json(json!({
            "query": "SELECT * FROM r WHERE r.user=@user",
            "parameters": [{"name": "@user", "value": "u1"}]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-ms-continuation", "page-2")
                .set_body_json(json!({"Documents": [{"id": "a"}]})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let query = Query::new("SELECT * FROM r WHERE r.user=@user").with_parameter("@user", "u1");
    let items: Vec<Value> = container(&server).query_items(&query, true).await.unwrap();

    let ids: Vec<&str> = items.iter().filter_map(|i| i["id"].as_str()).collect();
    assert_eq!(ids, ["a", "b"]);
}

#[tokio::test]
async fn test_create_item_sends_partition_key() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dbs/db/colls/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "conversations",
            "partitionKey": {"paths": ["/user"], "kind": "Hash"}
        })))
        .mount(&server)
        .await;

    let document = json!({"id": "c1", "user": "u1", "messages": []});
    Mock::given(method("POST"))
        .and(path("/dbs/db/colls/conversations/docs"))
        .and(header("x-ms-documentdb-partitionkey", r#"["u1"]"#))
        .and(body_json(document.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "c1", "user": "u1", "messages": [], "_etag": "\"00\""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let stored = container(&server).create_item(&document).await.unwrap();
    assert_eq!(stored["id"], "c1");
}

#[tokio::test]
async fn test_create_item_without_partition_value() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dbs/db/colls/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "conversations",
            "partitionKey": {"paths": ["/user"]}
        })))
        .mount(&server)
        .await;

    let err = container(&server)
        .create_item(&json!({"id": "c1"}))
        .await
        .unwrap_err();
    assert!(matches!(err, CosmosError::MissingPartitionKey { ref path } if path == "/user"));
}

#[tokio::test]
async fn test_conflict_surfaces_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/dbs/db/colls/conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "conversations"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "Conflict",
            "message": "Entity with the specified id already exists in the system."
        })))
        .mount(&server)
        .await;

    let err = container(&server)
        .create_item(&json!({"id": "c1"}))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(409));
}

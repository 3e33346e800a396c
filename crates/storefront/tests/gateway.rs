//! Integration tests for `ApiClient` using wiremock HTTP mocks.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use motoparts_storefront::api::{ApiClient, ApiError, MemoryTokenStorage, TokenStorage};
use motoparts_storefront::config::ApiConfig;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str, tokens: Arc<dyn TokenStorage>) -> ApiClient {
    let config = ApiConfig::new(base_url).expect("valid base url");
    ApiClient::new(&config, tokens)
}

#[tokio::test]
async fn bearer_token_is_attached_when_stored() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(
        &server.uri(),
        Arc::new(MemoryTokenStorage::with_token("tok-123")),
    );
    let body = client.get("/auth/me").await.expect("request succeeds");
    assert_eq!(body, json!({"id": 1}));
}

#[tokio::test]
async fn no_authorization_header_without_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Arc::new(MemoryTokenStorage::new()));
    client.get("/categories").await.expect("request succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn token_saved_after_construction_is_used() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orders"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let storage = Arc::new(MemoryTokenStorage::new());
    let client = test_client(&server.uri(), storage.clone());
    storage
        .save(&secrecy::SecretString::from("fresh".to_string()))
        .expect("memory save");

    client.get("/orders").await.expect("request succeeds");
}

#[tokio::test]
async fn json_body_and_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cart/items"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"product_id": "p1", "quantity": 2})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"item": {"id": 9}})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Arc::new(MemoryTokenStorage::new()));
    let body = client
        .post("/cart/items", json!({"product_id": "p1", "quantity": 2}))
        .await
        .expect("request succeeds");
    assert_eq!(body["item"]["id"], 9);
}

#[tokio::test]
async fn multipart_upload_does_not_claim_json() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/avatar"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"avatar": "a.png"})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Arc::new(MemoryTokenStorage::new()));
    let form = Form::new().part("avatar", Part::bytes(vec![1, 2, 3]).file_name("a.png"));
    client
        .upload("/users/avatar", form)
        .await
        .expect("upload succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"), "{content_type}");
    assert!(!content_type.contains("application/json"));
}

#[tokio::test]
async fn query_parameters_are_encoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/parts"))
        .and(query_param("search", "brake pads"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"parts": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Arc::new(MemoryTokenStorage::new()));
    client
        .get_with_query(
            "/parts",
            &[("search", "brake pads".to_string()), ("page", "2".to_string())],
        )
        .await
        .expect("request succeeds");
}

#[tokio::test]
async fn error_field_becomes_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/cart/items"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "Out of stock"})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Arc::new(MemoryTokenStorage::new()));
    let err = client
        .post("/cart/items", json!({}))
        .await
        .expect_err("400 is an error");

    assert_eq!(
        err,
        ApiError::Server {
            status: 400,
            message: "Out of stock".to_string()
        }
    );
    assert_eq!(err.to_string(), "Out of stock");
}

#[tokio::test]
async fn message_field_and_generic_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid token"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Arc::new(MemoryTokenStorage::new()));

    let err = client.get("/auth/me").await.expect_err("401");
    assert_eq!(err.to_string(), "Invalid token");
    assert_eq!(err.status(), Some(401));

    let err = client.get("/orders").await.expect_err("502");
    assert_eq!(err.to_string(), "Something went wrong");
}

#[tokio::test]
async fn empty_success_body_is_null() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/cart/items/c1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Arc::new(MemoryTokenStorage::new()));
    let body = client.delete("/cart/items/c1").await.expect("204 succeeds");
    assert!(body.is_null());
}

#[tokio::test]
async fn invalid_json_on_success_is_network_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/merch"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), Arc::new(MemoryTokenStorage::new()));
    let err = client.get("/merch").await.expect_err("parse failure");
    assert_eq!(err, ApiError::Network);
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let client = test_client("http://127.0.0.1:1", Arc::new(MemoryTokenStorage::new()));
    let err = client.get("/categories").await.expect_err("connection refused");
    assert_eq!(err, ApiError::Network);
    assert_eq!(err.to_string(), "Network error occurred");
}

#[tokio::test]
async fn invalid_user_agent_falls_back_to_default_client() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = ApiConfig::new(&server.uri()).expect("valid base url");
    config.user_agent = "bad\nagent".to_string();
    let client = ApiClient::new(&config, Arc::new(MemoryTokenStorage::new()));

    client.get("/categories").await.expect("request succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    let sent = requests[0]
        .headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok());
    assert_ne!(sent, Some("bad\nagent"));
}

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bookshelf_authz::{CookieConfig, CredentialStore, MemoryCookieJar};
use bookshelf_http::{ApiClient, ApiError};
use serde_json::{json, Value};

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": authorization, "content_type": content_type }))
}

async fn spawn_backend() -> SocketAddr {
    let app = Router::new()
        .route("/api/echo", get(echo_auth))
        .route(
            "/api/rejected",
            get(|| async {
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "message": "Title is required" })),
                )
            }),
        )
        .route(
            "/api/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "stack trace") }),
        )
        .route("/api/garbled", get(|| async { "not json" }))
        .route("/api/items/7", delete(|| async { StatusCode::OK }))
        .route(
            "/api/auth/signin",
            post(|headers: HeaderMap| async move {
                if headers.contains_key("authorization") {
                    "leaked".to_string()
                } else {
                    "fresh-token".to_string()
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> (ApiClient, Arc<CredentialStore>) {
    let credentials = Arc::new(CredentialStore::new(
        CookieConfig::default(),
        Arc::new(MemoryCookieJar::new()),
    ));
    let client = ApiClient::builder()
        .base_url(format!("http://{}/api", addr))
        .credentials(credentials.clone())
        .build()
        .unwrap();
    (client, credentials)
}

#[tokio::test]
async fn bearer_header_is_attached_when_token_present() {
    let addr = spawn_backend().await;
    let (client, credentials) = client_for(addr);
    credentials.set_token("secret-token").unwrap();

    let echoed: Value = client.get_json("/echo").await.unwrap();
    assert_eq!(echoed["authorization"], "Bearer secret-token");
    assert_eq!(echoed["content_type"], "application/json");
}

#[tokio::test]
async fn header_is_absent_without_token() {
    let addr = spawn_backend().await;
    let (client, _) = client_for(addr);

    let echoed: Value = client.get_json("/echo").await.unwrap();
    assert!(echoed["authorization"].is_null());
}

#[tokio::test]
async fn backend_message_is_surfaced() {
    let addr = spawn_backend().await;
    let (client, _) = client_for(addr);

    let err = client.get_json::<Value>("/rejected").await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert_eq!(err.to_string(), "Title is required");
}

#[tokio::test]
async fn non_json_error_body_degrades_to_generic_message() {
    let addr = spawn_backend().await;
    let (client, _) = client_for(addr);

    let err = client.get_json::<Value>("/broken").await.unwrap_err();
    assert_eq!(err.to_string(), "API error: 500");
}

#[tokio::test]
async fn undecodable_success_body_is_a_decode_error() {
    let addr = spawn_backend().await;
    let (client, _) = client_for(addr);

    let err = client.get_json::<Value>("/garbled").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn delete_ignores_empty_body() {
    let addr = spawn_backend().await;
    let (client, _) = client_for(addr);

    client.delete("/items/7").await.unwrap();
}

#[tokio::test]
async fn anonymous_post_never_sends_credentials() {
    let addr = spawn_backend().await;
    let (client, credentials) = client_for(addr);
    credentials.set_token("stale").unwrap();

    let body = json!({ "username": "reader", "password": "pw", "email": "r@example.com" });
    let token = client.post_anonymous("/auth/signin", &body).await.unwrap();
    assert_eq!(token, "fresh-token");
}

#[tokio::test]
async fn unreachable_backend_is_a_network_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (client, _) = client_for(addr);
    let err = client.get_json::<Value>("/echo").await.unwrap_err();
    assert!(err.is_network());
    assert_eq!(err.status(), None);
    assert!(!err.to_string().contains(&addr.to_string()));
}

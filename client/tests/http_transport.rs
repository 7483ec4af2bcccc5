//! Transport adapter tests against a local axum server.

#![allow(clippy::unwrap_used, clippy::panic)] // Test code can use unwrap and panic

use arcana_client::{ClientError, HttpSpreadsClient, HttpUsersClient, SpreadsInternalApi, UsersApi};
use arcana_core::Error;
use arcana_core::model::{SpreadId, UserId};
use axum::Router;
use axum::http::StatusCode;
use axum::routing::{delete, get};
use serde_json::json;
use std::time::Duration;

/// Serve a router on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn users_client(base_url: &str, timeout: Duration) -> HttpUsersClient {
    HttpUsersClient::builder()
        .base_url(base_url)
        .timeout(timeout)
        .build()
        .unwrap()
}

#[tokio::test]
async fn existing_user_is_ok() {
    let base = serve(Router::new().route(
        "/internal/users/:id",
        get(|| async { StatusCode::NO_CONTENT }),
    ))
    .await;

    let client = users_client(&base, Duration::from_secs(2));
    assert!(client.exists(UserId::new()).await.is_ok());
}

#[tokio::test]
async fn missing_user_is_a_business_not_found() {
    let base = serve(Router::new().route(
        "/internal/users/:id",
        get(|| async { StatusCode::NOT_FOUND }),
    ))
    .await;

    let client = users_client(&base, Duration::from_secs(2));
    let err = client.exists(UserId::new()).await.unwrap_err();
    match err {
        ClientError::Business(Error::NotFound { entity, .. }) => assert_eq!(entity, "user"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_is_infrastructure() {
    let base = serve(Router::new().route(
        "/internal/users/:id",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    ))
    .await;

    let client = users_client(&base, Duration::from_secs(2));
    let err = client.exists(UserId::new()).await.unwrap_err();
    assert!(!err.is_business(), "got {err:?}");
}

#[tokio::test]
async fn slow_callee_times_out_as_infrastructure() {
    let base = serve(Router::new().route(
        "/internal/users/:id",
        get(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            StatusCode::NO_CONTENT
        }),
    ))
    .await;

    let client = users_client(&base, Duration::from_millis(50));
    let err = client.exists(UserId::new()).await.unwrap_err();
    match err {
        ClientError::Infrastructure { detail } => assert_eq!(detail, "request timed out"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_callee_is_infrastructure() {
    // Bind a port and release it so the connection is refused.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = users_client(&format!("http://{addr}"), Duration::from_millis(500));
    let err = client.exists(UserId::new()).await.unwrap_err();
    assert!(!err.is_business(), "got {err:?}");
}

#[tokio::test]
async fn owner_is_parsed_from_the_response() {
    let owner = UserId::new();
    let base = serve(Router::new().route(
        "/internal/spreads/:id/owner",
        get(move || async move { axum::Json(json!({ "author_id": owner })) }),
    ))
    .await;

    let client = HttpSpreadsClient::builder()
        .base_url(&base)
        .build()
        .unwrap();
    let resolved = client.owner(SpreadId::new()).await.unwrap();
    assert_eq!(resolved, owner);
}

#[tokio::test]
async fn purge_accepts_no_content() {
    let base = serve(Router::new().route(
        "/internal/users/:id/data",
        delete(|| async { StatusCode::NO_CONTENT }),
    ))
    .await;

    let client = HttpSpreadsClient::builder()
        .base_url(&base)
        .build()
        .unwrap();
    assert!(client.purge_user_data(UserId::new()).await.is_ok());
}

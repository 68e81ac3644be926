//! Cloud Run listing against a fake Admin API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use warmfleet_core::{DiscoveryError, ProjectScope};
use warmfleet_discovery::{CloudRunDiscovery, MetadataTokenSource, ServiceDiscovery, StaticTokenSource};

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

fn discovery(base: &str) -> CloudRunDiscovery {
    CloudRunDiscovery::with_api_base(
        reqwest::Client::new(),
        Arc::new(StaticTokenSource::new("test-token")),
        base,
    )
}

async fn paged_services(
    Path((project, region)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if headers.get("authorization").and_then(|v| v.to_str().ok()) != Some("Bearer test-token") {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    let prefix = format!("projects/{project}/locations/{region}/services");
    match query.get("pageToken").map(String::as_str) {
        None => Json(json!({
            "services": [
                { "name": format!("{prefix}/api"), "uri": "https://api.run.app", "labels": { "warm": "true" } },
                { "name": format!("{prefix}/batch"), "uri": "https://batch.run.app" }
            ],
            "nextPageToken": "page-2"
        }))
        .into_response(),
        Some("page-2") => Json(json!({
            "services": [
                { "name": format!("{prefix}/web"), "uri": "https://web.run.app", "labels": { "warm": "false" } }
            ]
        }))
        .into_response(),
        Some(_) => (StatusCode::BAD_REQUEST, "unknown page").into_response(),
    }
}

#[tokio::test]
async fn follows_pagination_in_order() {
    let base = spawn(Router::new().route(
        "/v2/projects/{project}/locations/{region}/services",
        get(paged_services),
    ))
    .await;

    let services = discovery(&base)
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap();

    let names: Vec<&str> = services.iter().map(|s| s.short_name()).collect();
    assert_eq!(names, vec!["api", "batch", "web"]);
    assert_eq!(services[0].name, "projects/proj/locations/us-west1/services/api");
    assert_eq!(services[0].address, "https://api.run.app");
    assert!(services[0].has_label("warm", "true"));
    assert!(services[1].labels.is_empty());
}

#[tokio::test]
async fn empty_listing_is_empty_vec() {
    let base = spawn(Router::new().route(
        "/v2/projects/{project}/locations/{region}/services",
        get(|| async { Json(json!({})) }),
    ))
    .await;

    let services = discovery(&base)
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap();
    assert!(services.is_empty());
}

#[tokio::test]
async fn non_success_status_is_fatal() {
    let base = spawn(Router::new().route(
        "/v2/projects/{project}/locations/{region}/services",
        get(|| async { (StatusCode::FORBIDDEN, "permission denied") }),
    ))
    .await;

    let err = discovery(&base)
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap_err();

    match err {
        DiscoveryError::Status { status, body } => {
            assert_eq!(status, 403);
            assert_eq!(body, "permission denied");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn failing_second_page_fails_whole_listing() {
    let base = spawn(Router::new().route(
        "/v2/projects/{project}/locations/{region}/services",
        get(|Query(query): Query<HashMap<String, String>>| async move {
            if query.contains_key("pageToken") {
                (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
            } else {
                Json(json!({
                    "services": [{ "name": "a", "uri": "https://a" }],
                    "nextPageToken": "next"
                }))
                .into_response()
            }
        }),
    ))
    .await;

    let err = discovery(&base)
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::Status { status: 500, .. }));
}

#[tokio::test]
async fn repeated_page_token_is_rejected() {
    let base = spawn(Router::new().route(
        "/v2/projects/{project}/locations/{region}/services",
        get(|| async { Json(json!({ "services": [], "nextPageToken": "same" })) }),
    ))
    .await;

    let err = discovery(&base)
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::Decode(_)));
}

#[tokio::test]
async fn alternating_page_tokens_are_rejected() {
    let base = spawn(Router::new().route(
        "/v2/projects/{project}/locations/{region}/services",
        get(|Query(query): Query<HashMap<String, String>>| async move {
            let next = match query.get("pageToken").map(String::as_str) {
                Some("a") => "b",
                _ => "a",
            };
            Json(json!({ "services": [], "nextPageToken": next }))
        }),
    ))
    .await;

    let disc = discovery(&base);
    let scope = ProjectScope::new("proj", "us-west1");
    let listing = disc.list_services(&scope);
    let err = tokio::time::timeout(Duration::from_secs(5), listing)
        .await
        .expect("listing should terminate")
        .unwrap_err();
    match err {
        DiscoveryError::Decode(msg) => assert!(msg.contains("\"a\""), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let base = spawn(Router::new().route(
        "/v2/projects/{project}/locations/{region}/services",
        get(|| async { "not json" }),
    ))
    .await;

    let err = discovery(&base)
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::Decode(_)));
}

#[tokio::test]
async fn unreachable_upstream_is_request_error() {
    let err = discovery("http://127.0.0.1:1")
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap_err();
    match err {
        DiscoveryError::Request(msg) => {
            assert!(msg.to_lowercase().contains("connection refused"), "{msg}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn metadata_token_feeds_listing() {
    let metadata = spawn(Router::new().route(
        "/token",
        get(|headers: HeaderMap| async move {
            if headers.get("metadata-flavor").and_then(|v| v.to_str().ok()) == Some("Google") {
                Json(json!({ "access_token": "test-token", "expires_in": 3599, "token_type": "Bearer" }))
                    .into_response()
            } else {
                StatusCode::FORBIDDEN.into_response()
            }
        }),
    ))
    .await;
    let api = spawn(Router::new().route(
        "/v2/projects/{project}/locations/{region}/services",
        get(paged_services),
    ))
    .await;

    let client = reqwest::Client::new();
    let tokens = MetadataTokenSource::with_url(client.clone(), &format!("{metadata}/token"));
    let discovery = CloudRunDiscovery::with_api_base(client, Arc::new(tokens), &api);

    let services = discovery
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap();
    assert_eq!(services.len(), 3);
}

#[tokio::test]
async fn metadata_failure_is_token_error() {
    let metadata = spawn(Router::new().route(
        "/token",
        get(|| async { StatusCode::NOT_FOUND }),
    ))
    .await;

    let client = reqwest::Client::new();
    let tokens = MetadataTokenSource::with_url(client.clone(), &format!("{metadata}/token"));
    let discovery = CloudRunDiscovery::with_api_base(client, Arc::new(tokens), "http://127.0.0.1:1");

    let err = discovery
        .list_services(&ProjectScope::new("proj", "us-west1"))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "failed to get access token: 404");
}

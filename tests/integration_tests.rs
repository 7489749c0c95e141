//! Integration tests for the blog translation service
//!
//! These drive the full router built from configuration, backed by the
//! in-memory store and a mocked translation endpoint. Postgres-backed tests
//! live in src/db.rs and are ignored unless a database is available.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request as MockRequest, Respond, ResponseTemplate,
};

use blog_translate::{
    api::{build_router, AppState},
    app,
    config::{CacheBackend, Config},
    db::PostStore,
    i18n::Locale,
};

const API_PATH: &str = "/translate_a/single";

// ==================== Test Helpers ====================

/// Answers like the Google endpoint, translating `q` to "<tl>:<q>".
struct PrefixResponder;

impl Respond for PrefixResponder {
    fn respond(&self, request: &MockRequest) -> ResponseTemplate {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
                .unwrap_or_default()
        };
        let (target, text) = (param("tl"), param("q"));

        ResponseTemplate::new(200).set_body_json(json!([
            [[format!("{}:{}", target, text), text, null, null, 10]],
            null,
            "en"
        ]))
    }
}

/// Create a test config pointing at the mock endpoint (without database)
fn create_test_config(server_uri: &str) -> Config {
    Config {
        database_url: None,
        database_max_connections: 1,
        port: 0,
        translate_api_url: format!("{}{}", server_uri, API_PATH),
        translate_max_attempts: 3,
        translate_retry_delay: Duration::from_millis(5),
        cache_backend: CacheBackend::Memory,
        cache_ttl: Duration::from_secs(60),
    }
}

async fn create_state(server: &MockServer) -> AppState {
    app::build_state(&create_test_config(&server.uri()))
        .await
        .expect("Failed to build state")
}

async fn mock_translations(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(PrefixResponder)
        .mount(server)
        .await;
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create_post(app: &Router, title: &str, content: &str) -> i64 {
    let (status, json) = send(
        app,
        "POST",
        "/v1/posts",
        Some(json!({"title": title, "content": content})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    json["data"]["post"]["id"].as_i64().expect("post id")
}

// ==================== Workflow Tests ====================

#[tokio::test]
async fn test_create_then_read_in_hindi() {
    let server = MockServer::start().await;
    mock_translations(&server).await;
    let app = build_router(create_state(&server).await);

    let id = create_post(&app, "Hi", "World").await;

    let (status, json) = send(&app, "GET", &format!("/v1/posts/{}?lang=hi", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["locale"], "hi");
    assert_eq!(json["data"]["title"], "hi:Hi");
    assert_eq!(json["data"]["content"], "hi:World");
    assert_eq!(
        json["data"]["original_post"],
        json!({"title": "Hi", "content": "World"})
    );
    assert_eq!(json["data"]["available_translations"], json!(["hi", "gu"]));
}

#[tokio::test]
async fn test_create_response_carries_full_snapshot() {
    let server = MockServer::start().await;
    mock_translations(&server).await;
    let app = build_router(create_state(&server).await);

    let (status, json) = send(
        &app,
        "POST",
        "/v1/posts",
        Some(json!({"title": "Hi", "content": "World"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"], "Post created and translated to all languages");
    assert_eq!(
        json["data"]["translations"],
        json!({
            "en": {"title": "Hi", "content": "World"},
            "hi": {"title": "hi:Hi", "content": "hi:World"},
            "gu": {"title": "gu:Hi", "content": "gu:World"},
        })
    );
    assert_eq!(json["data"]["post"]["translations"], json["data"]["translations"]);
}

#[tokio::test]
async fn test_translate_unsupported_locale_is_422() {
    let server = MockServer::start().await;
    mock_translations(&server).await;
    let app = build_router(create_state(&server).await);
    let id = create_post(&app, "Hi", "World").await;

    let (status, json) = send(
        &app,
        "GET",
        &format!("/v1/posts/{}/translate?locale=fr", id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["success"], false);
    assert_eq!(json["errors"]["locale"][0], "The selected locale is invalid.");
}

#[tokio::test]
async fn test_delete_removes_post_and_translations() {
    let server = MockServer::start().await;
    mock_translations(&server).await;
    let state = create_state(&server).await;
    let app = build_router(state.clone());
    let id = create_post(&app, "Hi", "World").await;

    let (status, _) = send(&app, "DELETE", &format!("/v1/posts/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "GET", &format!("/v1/posts/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "Post not found");

    let rows = state.store.list_translations(id).await.expect("list");
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_update_retranslates() {
    let server = MockServer::start().await;
    mock_translations(&server).await;
    let app = build_router(create_state(&server).await);
    let id = create_post(&app, "Hi", "World").await;

    let (status, json) = send(
        &app,
        "PUT",
        &format!("/v1/posts/{}", id),
        Some(json!({"content": "Everyone"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Post updated and translations refreshed");

    let (_, json) = send(
        &app,
        "GET",
        &format!("/v1/posts/{}/translate?locale=gu", id),
        None,
    )
    .await;
    assert_eq!(json["data"]["title"], "gu:Hi");
    assert_eq!(json["data"]["content"], "gu:Everyone");
}

#[tokio::test]
async fn test_languages_endpoint() {
    let server = MockServer::start().await;
    let app = build_router(create_state(&server).await);

    let (status, json) = send(&app, "GET", "/v1/languages", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json,
        json!({
            "success": true,
            "data": {"en": "English", "hi": "Hindi", "gu": "Gujarati"},
        })
    );
}

// ==================== Cache Tests ====================

#[tokio::test]
async fn test_repeated_content_is_served_from_cache() {
    let server = MockServer::start().await;
    mock_translations(&server).await;
    let state = create_state(&server).await;
    let app = build_router(state.clone());

    create_post(&app, "Same", "Text").await;
    let calls_after_first = server.received_requests().await.unwrap().len();
    assert_eq!(calls_after_first, 4);

    create_post(&app, "Same", "Text").await;
    assert_eq!(server.received_requests().await.unwrap().len(), calls_after_first);

    let (_, json) = send(&app, "GET", "/v1/metrics/translation", None).await;
    assert_eq!(json["data"]["cache_hits"], 4);
    assert_eq!(json["data"]["cache_misses"], 4);
    assert_eq!(json["data"]["api_calls"], 4);
}

#[tokio::test]
async fn test_endpoint_failure_degrades_to_original_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let state = create_state(&server).await;
    let app = build_router(state.clone());

    let id = create_post(&app, "Hi", "World").await;

    let row = state
        .store
        .find_translation(id, Locale::Hi)
        .await
        .expect("find")
        .expect("row exists");
    assert_eq!(row.title, "Hi");
    assert_eq!(row.content, "World");

    // 2 texts x 2 locales, 3 attempts each
    assert_eq!(server.received_requests().await.unwrap().len(), 12);
    assert_eq!(state.metrics.degraded_translations(), 4);
    assert_eq!(state.metrics.report().degraded_rate, 100.0);
}

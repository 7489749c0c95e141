//! HTTP surface: `/v1` post endpoints, languages, metrics and health.

use crate::coordinator::{FanOut, PostTranslationCoordinator};
use crate::db::PostStore;
use crate::error::{ApiError, ApiResult};
use crate::i18n::{Locale, MetricsReport, TranslationMetrics};
use crate::models::{LocalizedText, Post, PostId};
use crate::validation::{
    locale_or_default, required_locale, validate_new_post, validate_post_changes, FieldErrors,
};
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub coordinator: Arc<PostTranslationCoordinator>,
    pub metrics: Arc<TranslationMetrics>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/posts", get(list_posts).post(create_post))
        .route(
            "/v1/posts/:id",
            get(show_post)
                .put(update_post)
                .patch(update_post)
                .delete(delete_post),
        )
        .route("/v1/posts/:id/translate", get(translate_post))
        .route("/v1/languages", get(languages))
        .route("/v1/metrics/translation", get(translation_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ==================== Response Types ====================

/// The `{success, message, locale, data}` envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<Locale>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            locale: None,
            data: Some(data),
        }
    }

    fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }

    fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = Some(locale);
        self
    }
}

impl Envelope<()> {
    fn message(message: &'static str) -> Self {
        Self {
            success: true,
            message: Some(message),
            locale: None,
            data: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct PostListItem {
    id: PostId,
    title: String,
    content: String,
    locale: Locale,
    original_post: Option<LocalizedText>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct PostDetail {
    id: PostId,
    title: String,
    content: String,
    original_post: Option<LocalizedText>,
    available_translations: Vec<Locale>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct CreatedPost {
    post: Post,
    translations: FanOut,
}

#[derive(Debug, Serialize)]
struct PostTranslationView {
    original_id: PostId,
    locale: Locale,
    title: String,
    content: String,
}

/// Code → English name for every supported locale, in enumeration order.
struct LanguageList;

impl Serialize for LanguageList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Locale::ALL.len()))?;
        for locale in Locale::ALL {
            map.serialize_entry(locale.code(), locale.name())?;
        }
        map.end()
    }
}

#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateQuery {
    locale: Option<String>,
}

// ==================== Helpers ====================

/// Ids that are not integers cannot exist, so they are reported as not found.
fn parse_id(raw: &str) -> ApiResult<PostId> {
    raw.trim()
        .parse::<PostId>()
        .map_err(|_| ApiError::post_not_found())
}

async fn load_post(state: &AppState, raw_id: &str) -> ApiResult<Post> {
    let id = parse_id(raw_id)?;
    state
        .store
        .find_post(id)
        .await?
        .ok_or_else(ApiError::post_not_found)
}

/// Parse a JSON request body; an empty body counts as `{}`.
fn json_body(bytes: &Bytes) -> ApiResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).map_err(|e| {
        debug!("Rejected request body: {}", e);
        FieldErrors::single("body", "The request body must be valid JSON.").into()
    })
}

/// English original, present only when rendering another locale
fn original_for(post: &Post, locale: Locale) -> Option<LocalizedText> {
    (!locale.is_canonical()).then(|| post.canonical())
}

// ==================== Handlers ====================

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Envelope<Vec<PostListItem>>>> {
    let locale = locale_or_default("lang", query.lang.as_deref())?;
    let posts = state.store.list_posts().await?;

    let mut items = Vec::with_capacity(posts.len());
    for post in posts {
        let translated = state.coordinator.get_translated(&post, locale).await?;
        items.push(PostListItem {
            id: post.id,
            original_post: original_for(&post, locale),
            title: translated.title,
            content: translated.content,
            locale: translated.locale,
            created_at: post.created_at,
            updated_at: post.updated_at,
        });
    }

    Ok(Json(Envelope::data(items).with_locale(locale)))
}

async fn create_post(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Envelope<CreatedPost>>)> {
    let new_post = validate_new_post(json_body(&body)?)?;

    let mut post = state.store.create_post(new_post).await?;
    info!("Created post {}", post.id);
    let translations = state
        .coordinator
        .translate_and_persist(&mut post, None)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(
            Envelope::data(CreatedPost { post, translations })
                .with_message("Post created and translated to all languages"),
        ),
    ))
}

async fn show_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<LangQuery>,
) -> ApiResult<Json<Envelope<PostDetail>>> {
    let locale = locale_or_default("lang", query.lang.as_deref())?;
    let post = load_post(&state, &id).await?;

    let translated = state.coordinator.get_translated(&post, locale).await?;
    let available_translations = state
        .store
        .list_translations(post.id)
        .await?
        .into_iter()
        .map(|row| row.locale)
        .collect();

    let detail = PostDetail {
        id: post.id,
        original_post: original_for(&post, locale),
        title: translated.title,
        content: translated.content,
        available_translations,
        created_at: post.created_at,
        updated_at: post.updated_at,
    };

    Ok(Json(Envelope::data(detail).with_locale(locale)))
}

async fn translate_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TranslateQuery>,
) -> ApiResult<Json<Envelope<PostTranslationView>>> {
    // Validation runs before the lookup
    let locale = required_locale("locale", query.locale.as_deref())?;
    let post = load_post(&state, &id).await?;

    let translated = state.coordinator.get_translated(&post, locale).await?;
    let view = PostTranslationView {
        original_id: post.id,
        locale: translated.locale,
        title: translated.title,
        content: translated.content,
    };

    Ok(Json(
        Envelope::data(view).with_message("Post translated successfully"),
    ))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<Envelope<Post>>> {
    // Existence is checked before the body is validated
    let post = load_post(&state, &id).await?;
    let changes = validate_post_changes(json_body(&body)?)?;

    if changes.is_empty() {
        debug!("Update of post {} changed nothing", post.id);
        return Ok(Json(
            Envelope::data(post).with_message("Post updated and translations refreshed"),
        ));
    }

    let mut post = state
        .store
        .update_post(post.id, changes)
        .await?
        .ok_or_else(ApiError::post_not_found)?;
    state
        .coordinator
        .translate_and_persist(&mut post, None)
        .await?;
    info!("Updated post {}", post.id);

    Ok(Json(
        Envelope::data(post).with_message("Post updated and translations refreshed"),
    ))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Envelope<()>>> {
    let id = parse_id(&id)?;
    if !state.store.delete_post(id).await? {
        return Err(ApiError::post_not_found());
    }
    info!("Deleted post {}", id);

    Ok(Json(Envelope::message("Post deleted successfully")))
}

async fn languages() -> Json<Envelope<LanguageList>> {
    Json(Envelope::data(LanguageList))
}

async fn translation_metrics(State(state): State<AppState>) -> Json<Envelope<MetricsReport>> {
    Json(Envelope::data(state.metrics.report()))
}

use crate::i18n::Locale;
use crate::models::{
    LocalizedText, NewPost, Post, PostChanges, PostId, PostTranslation, TranslationSnapshot,
};
use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::info;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Persistence for posts and their per-locale translation rows.
///
/// Deleting a post removes its translation rows. At most one translation row
/// exists per (post, locale); writing an existing pair overwrites it.
#[async_trait]
pub trait PostStore: Send + Sync {
    /// All posts, oldest first
    async fn list_posts(&self) -> Result<Vec<Post>>;

    async fn find_post(&self, id: PostId) -> Result<Option<Post>>;

    async fn create_post(&self, post: NewPost) -> Result<Post>;

    /// Apply the provided fields. Returns `None` if the post doesn't exist.
    async fn update_post(&self, id: PostId, changes: PostChanges) -> Result<Option<Post>>;

    /// Returns `true` if a post was deleted
    async fn delete_post(&self, id: PostId) -> Result<bool>;

    /// Overwrite the denormalized snapshot and return the refreshed post
    async fn save_snapshot(&self, id: PostId, snapshot: &TranslationSnapshot) -> Result<Post>;

    /// Insert or overwrite the (post, locale) translation row
    async fn upsert_translation(
        &self,
        post_id: PostId,
        locale: Locale,
        text: &LocalizedText,
    ) -> Result<PostTranslation>;

    async fn find_translation(
        &self,
        post_id: PostId,
        locale: Locale,
    ) -> Result<Option<PostTranslation>>;

    /// Every translation row of a post, in locale enumeration order
    async fn list_translations(&self, post_id: PostId) -> Result<Vec<PostTranslation>>;
}

// ==================== PostgreSQL ====================

const POST_COLUMNS: &str = "id, title, content, translations, created_at, updated_at";
const TRANSLATION_COLUMNS: &str = "id, post_id, locale, title, content, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    translations: Option<Json<TranslationSnapshot>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            translations: row.translations.map(|Json(snapshot)| snapshot),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TranslationRow {
    id: i64,
    post_id: i64,
    locale: String,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TranslationRow> for PostTranslation {
    type Error = anyhow::Error;

    fn try_from(row: TranslationRow) -> Result<Self> {
        let locale = row
            .locale
            .parse::<Locale>()
            .with_context(|| format!("Invalid locale stored for translation {}", row.id))?;

        Ok(PostTranslation {
            id: row.id,
            post_id: row.post_id,
            locale,
            title: row.title,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL and run pending migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        MIGRATOR
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        info!("✓ Database connected and migrated");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PostStore for Database {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts ORDER BY id",
            POST_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list posts")?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn find_post(&self, id: PostId) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {} FROM posts WHERE id = $1",
            POST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch post")?;

        Ok(row.map(Post::from))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "INSERT INTO posts (title, content, created_at, updated_at)
             VALUES ($1, $2, NOW(), NOW())
             RETURNING {}",
            POST_COLUMNS
        ))
        .bind(&post.title)
        .bind(&post.content)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create post")?;

        Ok(row.into())
    }

    async fn update_post(&self, id: PostId, changes: PostChanges) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts
             SET title = COALESCE($2, title),
                 content = COALESCE($3, content),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            POST_COLUMNS
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.content)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update post")?;

        Ok(row.map(Post::from))
    }

    async fn delete_post(&self, id: PostId) -> Result<bool> {
        // post_translations rows go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_snapshot(&self, id: PostId, snapshot: &TranslationSnapshot) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "UPDATE posts SET translations = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            POST_COLUMNS
        ))
        .bind(id)
        .bind(Json(snapshot))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to save translations snapshot")?;

        row.map(Post::from)
            .ok_or_else(|| anyhow!("Post {} no longer exists", id))
    }

    async fn upsert_translation(
        &self,
        post_id: PostId,
        locale: Locale,
        text: &LocalizedText,
    ) -> Result<PostTranslation> {
        let row = sqlx::query_as::<_, TranslationRow>(&format!(
            "INSERT INTO post_translations (post_id, locale, title, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, NOW(), NOW())
             ON CONFLICT (post_id, locale)
             DO UPDATE SET title = EXCLUDED.title,
                           content = EXCLUDED.content,
                           updated_at = NOW()
             RETURNING {}",
            TRANSLATION_COLUMNS
        ))
        .bind(post_id)
        .bind(locale.code())
        .bind(&text.title)
        .bind(&text.content)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Failed to save {} translation for post {}", locale, post_id))?;

        row.try_into()
    }

    async fn find_translation(
        &self,
        post_id: PostId,
        locale: Locale,
    ) -> Result<Option<PostTranslation>> {
        let row = sqlx::query_as::<_, TranslationRow>(&format!(
            "SELECT {} FROM post_translations WHERE post_id = $1 AND locale = $2",
            TRANSLATION_COLUMNS
        ))
        .bind(post_id)
        .bind(locale.code())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch post translation")?;

        row.map(PostTranslation::try_from).transpose()
    }

    async fn list_translations(&self, post_id: PostId) -> Result<Vec<PostTranslation>> {
        let rows = sqlx::query_as::<_, TranslationRow>(&format!(
            "SELECT {} FROM post_translations WHERE post_id = $1",
            TRANSLATION_COLUMNS
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list post translations")?;

        let mut translations = rows
            .into_iter()
            .map(PostTranslation::try_from)
            .collect::<Result<Vec<_>>>()?;
        translations.sort_by_key(|t| t.locale);
        Ok(translations)
    }
}

// ==================== In-memory ====================

#[derive(Default)]
struct MemoryState {
    last_post_id: PostId,
    last_translation_id: i64,
    posts: BTreeMap<PostId, Post>,
    translations: BTreeMap<(PostId, Locale), PostTranslation>,
}

/// Store kept in process memory. Used when no `DATABASE_URL` is configured
/// and by the test suites.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn list_posts(&self) -> Result<Vec<Post>> {
        Ok(self.state.read().await.posts.values().cloned().collect())
    }

    async fn find_post(&self, id: PostId) -> Result<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn create_post(&self, post: NewPost) -> Result<Post> {
        let mut state = self.state.write().await;
        state.last_post_id += 1;
        let now = Utc::now();

        let post = Post {
            id: state.last_post_id,
            title: post.title,
            content: post.content,
            translations: None,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, id: PostId, changes: PostChanges) -> Result<Option<Post>> {
        let mut state = self.state.write().await;
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        post.updated_at = Utc::now();
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: PostId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }
        state.translations.retain(|(post_id, _), _| *post_id != id);
        Ok(true)
    }

    async fn save_snapshot(&self, id: PostId, snapshot: &TranslationSnapshot) -> Result<Post> {
        let mut state = self.state.write().await;
        let post = state
            .posts
            .get_mut(&id)
            .ok_or_else(|| anyhow!("Post {} no longer exists", id))?;

        post.translations = Some(snapshot.clone());
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn upsert_translation(
        &self,
        post_id: PostId,
        locale: Locale,
        text: &LocalizedText,
    ) -> Result<PostTranslation> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&post_id) {
            bail!(
                "Failed to save {} translation for post {}: post does not exist",
                locale,
                post_id
            );
        }

        let now = Utc::now();
        if let Some(existing) = state.translations.get_mut(&(post_id, locale)) {
            existing.title = text.title.clone();
            existing.content = text.content.clone();
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        state.last_translation_id += 1;
        let row = PostTranslation {
            id: state.last_translation_id,
            post_id,
            locale,
            title: text.title.clone(),
            content: text.content.clone(),
            created_at: now,
            updated_at: now,
        };
        state.translations.insert((post_id, locale), row.clone());
        Ok(row)
    }

    async fn find_translation(
        &self,
        post_id: PostId,
        locale: Locale,
    ) -> Result<Option<PostTranslation>> {
        Ok(self
            .state
            .read()
            .await
            .translations
            .get(&(post_id, locale))
            .cloned())
    }

    async fn list_translations(&self, post_id: PostId) -> Result<Vec<PostTranslation>> {
        Ok(self
            .state
            .read()
            .await
            .translations
            .range((post_id, Locale::En)..=(post_id, Locale::Gu))
            .map(|(_, row)| row.clone())
            .collect())
    }
}

//! Time-bounded memoization of translation results.
//!
//! Keys are content-addressed: the text itself never appears in the key, only
//! its BLAKE3 digest, so key size stays bounded for arbitrarily long posts.
//! There is no capacity bound and no single-flight: two concurrent misses for
//! the same key both run their computation and the later store wins.

use crate::i18n::{Locale, TranslationMetrics};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::PgPool;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default freshness window for cached translations (30 days)
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Cache key derived from (source locale, target locale, content digest).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(source: Locale, target: Locale, text: &str) -> Self {
        let digest = blake3::hash(text.as_bytes());
        Self(format!(
            "translation_{}_{}_{}",
            source.code(),
            target.code(),
            digest.to_hex()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Memoization seam used by the translation provider.
#[async_trait]
pub trait TranslationCache: Send + Sync {
    /// Return the fresh cached value for `key`, or run `compute`, store its
    /// result for the cache's TTL and return it.
    ///
    /// `compute` is only polled on a miss.
    async fn get_or_compute(&self, key: &CacheKey, compute: BoxFuture<'_, String>) -> String;
}

// ==================== In-memory backend ====================

/// Process-local cache. Entries expire `ttl` after they were stored and are
/// evicted by moka's housekeeping; `purge_expired` forces that to run now.
pub struct MemoryCache {
    entries: moka::future::Cache<CacheKey, String>,
    metrics: Arc<TranslationMetrics>,
}

impl MemoryCache {
    pub fn new(ttl: Duration, metrics: Arc<TranslationMetrics>) -> Self {
        let entries = moka::future::Cache::builder().time_to_live(ttl).build();
        Self { entries, metrics }
    }

    /// Drop every expired entry
    pub async fn purge_expired(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Number of entries currently held (exact after `purge_expired`)
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }
}

#[async_trait]
impl TranslationCache for MemoryCache {
    async fn get_or_compute(&self, key: &CacheKey, compute: BoxFuture<'_, String>) -> String {
        if let Some(value) = self.entries.get(key).await {
            self.metrics.record_cache_hit();
            debug!("Translation cache hit: {}", key);
            return value;
        }

        self.metrics.record_cache_miss();
        let value = compute.await;
        self.entries.insert(key.clone(), value.clone()).await;
        value
    }
}

// ==================== PostgreSQL backend ====================

/// Cache stored in the `translation_cache` table, surviving restarts.
///
/// Database errors never reach the caller: a failed read is a miss and a
/// failed write is skipped, both logged.
pub struct PgCache {
    pool: PgPool,
    ttl: Duration,
    metrics: Arc<TranslationMetrics>,
}

impl PgCache {
    pub fn new(pool: PgPool, ttl: Duration, metrics: Arc<TranslationMetrics>) -> Self {
        Self { pool, ttl, metrics }
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(
            "SELECT value FROM translation_cache WHERE cache_key = $1 AND expires_at > NOW()",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read translation cache")?;

        Ok(value)
    }

    async fn put(&self, key: &CacheKey, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO translation_cache (cache_key, value, expires_at)
            VALUES ($1, $2, NOW() + make_interval(secs => $3))
            ON CONFLICT (cache_key)
            DO UPDATE SET value = EXCLUDED.value, expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(key.as_str())
        .bind(value)
        .bind(self.ttl.as_secs_f64())
        .execute(&self.pool)
        .await
        .context("Failed to write translation cache")?;

        Ok(())
    }

    /// Delete rows past their expiry. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM translation_cache WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await
            .context("Failed to purge expired translation cache rows")?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TranslationCache for PgCache {
    async fn get_or_compute(&self, key: &CacheKey, compute: BoxFuture<'_, String>) -> String {
        match self.get(key).await {
            Ok(Some(value)) => {
                self.metrics.record_cache_hit();
                debug!("Translation cache hit: {}", key);
                return value;
            }
            Ok(None) => {}
            Err(e) => warn!("Treating translation cache read failure as a miss: {:#}", e),
        }

        self.metrics.record_cache_miss();
        let value = compute.await;
        if let Err(e) = self.put(key, &value).await {
            warn!("Skipping translation cache store: {:#}", e);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn counting_compute(counter: Arc<AtomicU32>, value: &str) -> BoxFuture<'static, String> {
        let value = value.to_string();
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
            value
        })
    }

    // ==================== CacheKey Tests ====================

    #[test]
    fn test_key_is_deterministic() {
        let a = CacheKey::new(Locale::En, Locale::Hi, "Hello");
        let b = CacheKey::new(Locale::En, Locale::Hi, "Hello");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("translation_en_hi_"));
    }

    #[test]
    fn test_key_depends_on_locales() {
        let hi = CacheKey::new(Locale::En, Locale::Hi, "Hello");
        let gu = CacheKey::new(Locale::En, Locale::Gu, "Hello");
        let reverse = CacheKey::new(Locale::Hi, Locale::En, "Hello");
        assert_ne!(hi, gu);
        assert_ne!(hi, reverse);
    }

    #[test]
    fn test_key_does_not_contain_text() {
        let key = CacheKey::new(Locale::En, Locale::Gu, "secret post body");
        assert!(!key.as_str().contains("secret"));
    }

    proptest! {
        #[test]
        fn prop_key_length_is_bounded(text in ".{0,2000}") {
            let key = CacheKey::new(Locale::En, Locale::Hi, &text);
            // "translation_en_hi_" + 64 hex chars
            prop_assert_eq!(key.as_str().len(), 18 + 64);
        }

        #[test]
        fn prop_distinct_texts_give_distinct_keys(a in ".{0,200}", b in ".{0,200}") {
            prop_assume!(a != b);
            prop_assert_ne!(
                CacheKey::new(Locale::En, Locale::Hi, &a),
                CacheKey::new(Locale::En, Locale::Hi, &b)
            );
        }
    }

    // ==================== MemoryCache Tests ====================

    #[tokio::test]
    async fn test_miss_computes_and_hit_does_not() {
        let metrics = Arc::new(TranslationMetrics::new());
        let cache = MemoryCache::new(DEFAULT_TTL, metrics.clone());
        let counter = Arc::new(AtomicU32::new(0));
        let key = CacheKey::new(Locale::En, Locale::Hi, "Hello");

        let first = cache
            .get_or_compute(&key, counting_compute(counter.clone(), "नमस्ते"))
            .await;
        let second = cache
            .get_or_compute(&key, counting_compute(counter.clone(), "ignored"))
            .await;

        assert_eq!(first, "नमस्ते");
        assert_eq!(second, "नमस्ते");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.cache_misses(), 1);
        assert_eq!(metrics.cache_hits(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let cache = MemoryCache::new(DEFAULT_TTL, Arc::new(TranslationMetrics::new()));
        let counter = Arc::new(AtomicU32::new(0));

        let hi = CacheKey::new(Locale::En, Locale::Hi, "Hello");
        let gu = CacheKey::new(Locale::En, Locale::Gu, "Hello");

        assert_eq!(
            cache.get_or_compute(&hi, counting_compute(counter.clone(), "hi")).await,
            "hi"
        );
        assert_eq!(
            cache.get_or_compute(&gu, counting_compute(counter.clone(), "gu")).await,
            "gu"
        );
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_recomputed() {
        let cache = MemoryCache::new(
            Duration::from_millis(20),
            Arc::new(TranslationMetrics::new()),
        );
        let counter = Arc::new(AtomicU32::new(0));
        let key = CacheKey::new(Locale::En, Locale::Gu, "Hello");

        cache
            .get_or_compute(&key, counting_compute(counter.clone(), "old"))
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        let refreshed = cache
            .get_or_compute(&key, counting_compute(counter.clone(), "new"))
            .await;

        assert_eq!(refreshed, "new");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_purge_drops_expired_entries() {
        let cache = MemoryCache::new(
            Duration::from_millis(20),
            Arc::new(TranslationMetrics::new()),
        );
        let key = CacheKey::new(Locale::En, Locale::Hi, "Never asked again");

        cache
            .get_or_compute(&key, Box::pin(async { "value".to_string() }))
            .await;
        cache.purge_expired().await;
        assert_eq!(cache.entry_count(), 1);

        tokio::time::sleep(Duration::from_millis(50)).await;
        cache.purge_expired().await;
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_usable_as_trait_object() {
        let cache: Arc<dyn TranslationCache> = Arc::new(MemoryCache::new(
            DEFAULT_TTL,
            Arc::new(TranslationMetrics::new()),
        ));
        let key = CacheKey::new(Locale::En, Locale::Hi, "x");
        let value = cache
            .get_or_compute(&key, Box::pin(async { "y".to_string() }))
            .await;
        assert_eq!(value, "y");
    }
}

//! Builds the shared application state from configuration.

use crate::api::AppState;
use crate::cache::{MemoryCache, PgCache, TranslationCache};
use crate::config::{CacheBackend, Config};
use crate::coordinator::PostTranslationCoordinator;
use crate::db::{Database, MemoryStore, PostStore};
use crate::i18n::TranslationMetrics;
use crate::translation::GoogleTranslator;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn build_state(config: &Config) -> Result<AppState> {
    let metrics = Arc::new(TranslationMetrics::new());

    let database = match &config.database_url {
        Some(url) => Some(Database::connect(url, config.database_max_connections).await?),
        None => {
            warn!("DATABASE_URL not set, posts are kept in memory only");
            None
        }
    };

    let cache: Arc<dyn TranslationCache> = match (config.cache_backend, &database) {
        (CacheBackend::Database, Some(db)) => {
            let cache = PgCache::new(db.pool().clone(), config.cache_ttl, metrics.clone());
            match cache.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => info!("Purged {} expired translation cache rows", removed),
                Err(e) => warn!("Could not purge translation cache: {:#}", e),
            }
            Arc::new(cache)
        }
        // Config::from_env rejects a database cache without a URL
        _ => Arc::new(MemoryCache::new(config.cache_ttl, metrics.clone())),
    };

    let store: Arc<dyn PostStore> = match database {
        Some(db) => Arc::new(db),
        None => Arc::new(MemoryStore::new()),
    };

    let client = reqwest::Client::builder()
        .user_agent(concat!("blog-translate/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;
    let provider = Arc::new(GoogleTranslator::from_config(
        client,
        config,
        cache,
        metrics.clone(),
    ));

    let coordinator = Arc::new(PostTranslationCoordinator::new(store.clone(), provider));

    Ok(AppState {
        store,
        coordinator,
        metrics,
    })
}

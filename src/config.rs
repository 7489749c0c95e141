use crate::retry::RetryConfig;
use anyhow::{bail, Context, Result};
use std::str::FromStr;
use std::time::Duration;

/// Default public endpoint for machine translation.
pub const DEFAULT_TRANSLATE_API_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Longest accepted cache freshness window, in days
pub const MAX_CACHE_TTL_DAYS: u64 = 3650;

/// Where translation results are memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackend {
    /// Process-local map, lost on restart
    Memory,
    /// `translation_cache` table in the posts database
    Database,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CacheBackend::Memory),
            "database" | "db" | "postgres" => Ok(CacheBackend::Database),
            other => bail!("Unknown translation cache backend: '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: Option<String>,
    pub database_max_connections: u32,

    // Web server
    pub port: u16,

    // Translation endpoint
    pub translate_api_url: String,
    pub translate_max_attempts: u32,
    pub translate_retry_delay: Duration,

    // Translation cache
    pub cache_backend: CacheBackend,
    pub cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let cache_backend = match std::env::var("TRANSLATION_CACHE_BACKEND") {
            Ok(value) => value
                .parse::<CacheBackend>()
                .context("Invalid TRANSLATION_CACHE_BACKEND")?,
            Err(_) => CacheBackend::Memory,
        };

        if cache_backend == CacheBackend::Database && database_url.is_none() {
            bail!("TRANSLATION_CACHE_BACKEND=database requires DATABASE_URL to be set");
        }

        let cache_ttl_days: u64 = parse_env("TRANSLATION_CACHE_TTL_DAYS").unwrap_or(30);
        if cache_ttl_days > MAX_CACHE_TTL_DAYS {
            bail!(
                "TRANSLATION_CACHE_TTL_DAYS must be at most {} (got {})",
                MAX_CACHE_TTL_DAYS,
                cache_ttl_days
            );
        }

        Ok(Self {
            database_url,
            database_max_connections: parse_env("DATABASE_MAX_CONNECTIONS").unwrap_or(5),

            port: parse_env("PORT").unwrap_or(8080),

            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_TRANSLATE_API_URL.to_string()),
            translate_max_attempts: parse_env::<u32>("TRANSLATE_MAX_ATTEMPTS")
                .unwrap_or(3)
                .max(1),
            translate_retry_delay: Duration::from_millis(
                parse_env("TRANSLATE_RETRY_DELAY_MS").unwrap_or(100),
            ),

            cache_backend,
            cache_ttl: Duration::from_secs(cache_ttl_days * 24 * 60 * 60),
        })
    }

    /// Retry policy for calls to the translation endpoint
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.translate_max_attempts, self.translate_retry_delay)
    }
}

/// Read and parse an env var, treating missing or malformed values as unset
fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

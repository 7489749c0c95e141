use crate::cache::{CacheKey, TranslationCache};
use crate::config::Config;
use crate::i18n::{Locale, TranslationMetrics};
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

/// Failure talking to the translation endpoint.
///
/// Never escapes the provider; it only drives retries and logging.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to translation endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("translation endpoint returned {0}")]
    Status(StatusCode),

    #[error("translation response was not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("translation response had an unexpected shape")]
    UnexpectedShape,
}

impl ProviderError {
    /// Transport failures, 429 and 5xx are worth another attempt
    fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Status(status) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ProviderError::Decode(_) | ProviderError::UnexpectedShape => false,
        }
    }
}

/// Translates single strings between supported locales.
///
/// Implementations degrade instead of failing: whatever goes wrong, the
/// caller gets a string back (the original text in the worst case).
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(&self, text: &str, target: Locale, source: Locale) -> String;

    /// Translate every value of `texts` independently, keeping the keys.
    async fn translate_bulk(
        &self,
        texts: &BTreeMap<String, String>,
        target: Locale,
        source: Locale,
    ) -> BTreeMap<String, String> {
        let mut translated = BTreeMap::new();
        for (key, text) in texts {
            translated.insert(key.clone(), self.translate(text, target, source).await);
        }
        translated
    }
}

/// Client for the public Google Translate `translate_a/single` endpoint,
/// memoized through a [`TranslationCache`].
pub struct GoogleTranslator {
    client: reqwest::Client,
    api_url: String,
    retry: RetryConfig,
    cache: Arc<dyn TranslationCache>,
    metrics: Arc<TranslationMetrics>,
}

impl GoogleTranslator {
    pub fn new(
        client: reqwest::Client,
        api_url: impl Into<String>,
        retry: RetryConfig,
        cache: Arc<dyn TranslationCache>,
        metrics: Arc<TranslationMetrics>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            retry,
            cache,
            metrics,
        }
    }

    pub fn from_config(
        client: reqwest::Client,
        config: &Config,
        cache: Arc<dyn TranslationCache>,
        metrics: Arc<TranslationMetrics>,
    ) -> Self {
        Self::new(
            client,
            config.translate_api_url.clone(),
            config.retry_config(),
            cache,
            metrics,
        )
    }

    /// One translation, bypassing the cache; falls back to `text` on failure
    async fn translate_uncached(&self, text: &str, target: Locale, source: Locale) -> String {
        match self.fetch(text, target, source).await {
            Ok(translated) => translated,
            Err(e) => {
                self.metrics.record_degraded_translation();
                error!(
                    "Translation error ({} -> {}), returning original text: {}",
                    source, target, e
                );
                text.to_string()
            }
        }
    }

    async fn fetch(
        &self,
        text: &str,
        target: Locale,
        source: Locale,
    ) -> Result<String, ProviderError> {
        with_retry_if(
            &self.retry,
            &format!("Translation to {}", target.name()),
            || self.request_once(text, target, source),
            ProviderError::is_retryable,
        )
        .await
    }

    async fn request_once(
        &self,
        text: &str,
        target: Locale,
        source: Locale,
    ) -> Result<String, ProviderError> {
        self.metrics.record_api_call();

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("client", "gtx"),
                ("sl", source.code()),
                ("tl", target.code()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status));
        }

        let body = response.text().await?;
        let payload: Value = serde_json::from_str(&body)?;
        extract_translation(&payload).ok_or(ProviderError::UnexpectedShape)
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslator {
    async fn translate(&self, text: &str, target: Locale, source: Locale) -> String {
        if source == target || text.trim().is_empty() {
            return text.to_string();
        }

        let key = CacheKey::new(source, target, text);
        debug!("Translating {} chars {} -> {}", text.len(), source, target);
        self.cache
            .get_or_compute(&key, Box::pin(self.translate_uncached(text, target, source)))
            .await
    }
}

/// Pull the translated string out of a `translate_a/single` payload.
///
/// The payload looks like `[[["translated", "original", ...], ...], null, "en", ...]`.
/// Long inputs come back split into several segments, which are joined in order.
fn extract_translation(payload: &Value) -> Option<String> {
    let segments = payload.get(0)?.as_array()?;
    let mut translated = segments.first()?.get(0)?.as_str()?.to_string();

    for segment in &segments[1..] {
        if let Some(part) = segment.get(0).and_then(Value::as_str) {
            translated.push_str(part);
        }
    }

    Some(translated)
}

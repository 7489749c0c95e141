//! Translation metrics and observability module.
//!
//! Tracks cache hit rates, calls to the external translation endpoint and
//! calls that degraded to the original text.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Translation counters shared by the cache and the provider.
///
/// One instance is created at startup and handed out behind an `Arc`.
#[derive(Debug, Default)]
pub struct TranslationMetrics {
    /// Number of times a translation was found in cache
    cache_hits: AtomicUsize,

    /// Number of times a translation was not found in cache
    cache_misses: AtomicUsize,

    /// Number of HTTP attempts made to the translation endpoint
    api_calls: AtomicUsize,

    /// Number of translations that fell back to the original text
    degraded_translations: AtomicUsize,
}

impl TranslationMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit (translation found in cache).
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache miss (translation not found in cache).
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an HTTP attempt against the translation endpoint.
    pub fn record_api_call(&self) {
        self.api_calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a translation that degraded to the original text.
    pub fn record_degraded_translation(&self) {
        self.degraded_translations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> usize {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> usize {
        self.cache_misses.load(Ordering::Relaxed)
    }

    pub fn api_calls(&self) -> usize {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn degraded_translations(&self) -> usize {
        self.degraded_translations.load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let hits = self.cache_hits();
        let misses = self.cache_misses();
        let total_cache_queries = hits + misses;
        let cache_hit_rate = if total_cache_queries > 0 {
            (hits as f64 / total_cache_queries as f64) * 100.0
        } else {
            0.0
        };

        let calls = self.api_calls();
        let degraded = self.degraded_translations();
        // Every miss computes one translation, so misses bound the degraded count
        let degraded_rate = if misses > 0 {
            (degraded as f64 / misses as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            cache_hits: hits,
            cache_misses: misses,
            cache_hit_rate,
            api_calls: calls,
            degraded_translations: degraded,
            degraded_rate,
        }
    }
}

/// Metrics report containing current translation statistics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    /// Number of cache hits
    pub cache_hits: usize,

    /// Number of cache misses
    pub cache_misses: usize,

    /// Cache hit rate as a percentage (0-100)
    pub cache_hit_rate: f64,

    /// Number of HTTP attempts made
    pub api_calls: usize,

    /// Number of degraded translations
    pub degraded_translations: usize,

    /// Share of computed translations that degraded, as a percentage (0-100)
    pub degraded_rate: f64,
}

//! Internationalization (i18n) module.
//!
//! - `registry`: static metadata for every supported locale
//! - `locale`: the closed `Locale` enumeration used across the crate
//! - `metrics`: translation cache and provider counters
//!
//! # Example
//!
//! ```rust,ignore
//! use blog_translate::i18n::Locale;
//!
//! let hindi: Locale = "hi".parse()?;
//! assert!(!hindi.is_canonical());
//! ```

mod locale;
mod metrics;
mod registry;

pub use locale::{Locale, UnsupportedLocale};
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LocaleConfig, LocaleRegistry};

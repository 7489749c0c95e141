//! Locale type: the closed set of languages posts are rendered in.

use crate::i18n::{LocaleConfig, LocaleRegistry};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported locale.
///
/// Declaration order is the fan-out order; `En` is the canonical locale and
/// is always handled first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En = 0,
    Hi = 1,
    Gu = 2,
}

/// Error for a locale code outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported locale code: '{0}'")]
pub struct UnsupportedLocale(pub String);

impl Locale {
    /// Every supported locale in enumeration order.
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Hi, Locale::Gu];

    /// Get the canonical (source) locale.
    pub fn canonical() -> Locale {
        LocaleRegistry::canonical().locale
    }

    /// Locales that receive machine translations.
    pub fn translation_targets() -> impl Iterator<Item = Locale> {
        Self::ALL.into_iter().filter(|locale| !locale.is_canonical())
    }

    /// Short language code (e.g., "en", "hi").
    pub fn code(&self) -> &'static str {
        self.config().code
    }

    /// Registry entry for this locale.
    pub fn config(&self) -> &'static LocaleConfig {
        LocaleRegistry::config(*self)
    }

    /// English display name (e.g., "Gujarati").
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    /// `true` if this is the source locale, `false` if it's a translation target.
    pub fn is_canonical(&self) -> bool {
        self.config().is_canonical
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::canonical()
    }
}

impl FromStr for Locale {
    type Err = UnsupportedLocale;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        LocaleRegistry::get_by_code(code)
            .map(|entry| entry.locale)
            .ok_or_else(|| UnsupportedLocale(code.to_string()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

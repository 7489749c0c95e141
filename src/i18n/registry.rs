//! Locale registry: single source of truth for locale metadata.
//!
//! The set of locales is closed (see [`Locale`](super::Locale)); this table
//! only carries the display metadata and canonical flag for each of them.

use super::Locale;

/// Metadata for a supported locale.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// The locale this entry describes
    pub locale: Locale,

    /// Short language code (e.g., "en", "hi")
    pub code: &'static str,

    /// English name of the language (e.g., "Hindi")
    pub name: &'static str,

    /// Whether this is the canonical/source locale (exactly one is)
    pub is_canonical: bool,
}

/// Registry entries, in enumeration order.
static LOCALES: [LocaleConfig; 3] = [
    LocaleConfig {
        locale: Locale::En,
        code: "en",
        name: "English",
        is_canonical: true,
    },
    LocaleConfig {
        locale: Locale::Hi,
        code: "hi",
        name: "Hindi",
        is_canonical: false,
    },
    LocaleConfig {
        locale: Locale::Gu,
        code: "gu",
        name: "Gujarati",
        is_canonical: false,
    },
];

/// Read-only view over the locale table.
pub struct LocaleRegistry;

impl LocaleRegistry {
    /// All locale entries in enumeration order.
    pub fn list() -> &'static [LocaleConfig] {
        &LOCALES
    }

    /// Look up a locale entry by its code.
    ///
    /// # Returns
    /// * `Some(&LocaleConfig)` if the code is supported
    /// * `None` otherwise
    pub fn get_by_code(code: &str) -> Option<&'static LocaleConfig> {
        LOCALES.iter().find(|entry| entry.code == code)
    }

    /// The canonical (source) locale entry.
    pub fn canonical() -> &'static LocaleConfig {
        // Table is static; index 0 is English.
        &LOCALES[0]
    }

    /// Entry for a given locale.
    pub fn config(locale: Locale) -> &'static LocaleConfig {
        &LOCALES[locale as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_code_english() {
        let config = LocaleRegistry::get_by_code("en").expect("en is supported");
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.name, "English");
        assert!(config.is_canonical);
    }

    #[test]
    fn test_get_by_code_hindi() {
        let config = LocaleRegistry::get_by_code("hi").expect("hi is supported");
        assert_eq!(config.locale, Locale::Hi);
        assert_eq!(config.name, "Hindi");
        assert!(!config.is_canonical);
    }

    #[test]
    fn test_get_by_code_gujarati() {
        let config = LocaleRegistry::get_by_code("gu").expect("gu is supported");
        assert_eq!(config.locale, Locale::Gu);
        assert_eq!(config.name, "Gujarati");
    }

    #[test]
    fn test_get_by_code_unknown() {
        assert!(LocaleRegistry::get_by_code("fr").is_none());
        assert!(LocaleRegistry::get_by_code("EN").is_none());
        assert!(LocaleRegistry::get_by_code("").is_none());
    }

    #[test]
    fn test_exactly_one_canonical() {
        let canonical: Vec<_> = LocaleRegistry::list()
            .iter()
            .filter(|entry| entry.is_canonical)
            .collect();
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].code, LocaleRegistry::canonical().code);
    }

    #[test]
    fn test_table_matches_enum_order() {
        for (index, entry) in LocaleRegistry::list().iter().enumerate() {
            assert_eq!(entry.locale as usize, index);
            assert_eq!(LocaleRegistry::config(entry.locale).code, entry.code);
        }
    }
}

//! Normalized account provider record

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Locale key used for labels without an `xml:lang`
pub const DEFAULT_LOCALE: &str = "default";

/// The registration built from one `<account-provider>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountProviderRecord {
    /// Owning application ID; the only key the store uses
    pub app_id: String,

    /// Service provider identifier
    pub provider_id: Option<String>,

    pub multiple_accounts_supported: bool,

    /// Resolved absolute path of the `account` icon
    pub icon_path: Option<String>,

    /// Resolved absolute path of the `account-small` icon
    pub small_icon_path: Option<String>,

    /// Normalized locale (`xx_YY` or `default`) -> display text
    pub labels: BTreeMap<String, String>,

    /// Provider feature identifiers
    pub capabilities: BTreeSet<String>,
}

impl AccountProviderRecord {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    /// Set a label, normalizing the language tag; later labels for a locale win
    pub fn set_label(&mut self, lang: Option<&str>, text: impl Into<String>) {
        let locale = lang
            .map(normalize_locale)
            .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        self.labels.insert(locale, text.into());
    }

    pub fn label(&self, locale: &str) -> Option<&str> {
        self.labels.get(locale).map(String::as_str)
    }

    pub fn add_capability(&mut self, capability: impl Into<String>) {
        self.capabilities.insert(capability.into());
    }

    /// Pretty-printed JSON form
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Normalize an `xml:lang` tag: `en-us` -> `en_US`
///
/// Only the first hyphen splits; a tag without one is kept as-is.
pub fn normalize_locale(lang: &str) -> String {
    match lang.split_once('-') {
        Some((language, region)) => format!("{}_{}", language, region.to_ascii_uppercase()),
        None => lang.to_string(),
    }
}

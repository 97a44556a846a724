//! Icon path resolution
//!
//! Turns the value of an `<icon>` element into an absolute path. Rules are
//! checked in order and the first match wins:
//!
//! 1. System icons (and the legacy small icon) are used verbatim
//! 2. Built-in apps use their fixed shared resource directory
//! 3. Anything else is joined to the directory reported by the app manager
//!
//! Resolution is string composition only; nothing is checked on disk.

use crate::config::IconConfig;
use crate::host::SharedResourceLookup;
use crate::{IngestError, Result};

/// Which icon an `<icon section="...">` element sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSection {
    Account,
    AccountSmall,
}

impl IconSection {
    /// Parse the `section` attribute; unknown sections yield `None`
    pub fn from_attr(section: &str) -> Option<Self> {
        match section {
            "account" => Some(IconSection::Account),
            "account-small" => Some(IconSection::AccountSmall),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IconSection::Account => "account",
            IconSection::AccountSmall => "account-small",
        }
    }
}

/// Resolves manifest icon values for one ingestion
pub struct IconResolver<'a> {
    policy: &'a IconConfig,
    apps: &'a dyn SharedResourceLookup,
}

impl<'a> IconResolver<'a> {
    pub fn new(policy: &'a IconConfig, apps: &'a dyn SharedResourceLookup) -> Self {
        Self { policy, apps }
    }

    pub fn resolve(&self, app_id: &str, section: IconSection, raw: &str) -> Result<String> {
        if self.is_verbatim(section, raw) {
            tracing::debug!(section = section.as_str(), path = raw, "Using icon path verbatim");
            return Ok(raw.to_string());
        }

        let builtin = self.policy.builtins.iter().find(|b| {
            b.app_id == app_id && (section == IconSection::Account || b.small_icon)
        });
        if let Some(builtin) = builtin {
            let path = format!("{}{}", builtin.resource_dir, raw);
            tracing::debug!(app_id, section = section.as_str(), path = %path, "Built-in icon path");
            return Ok(path);
        }

        let dir = self.apps.shared_resource_path(app_id).map_err(|e| {
            tracing::error!(app_id, error = %e, "Failed to get the shared resource path");
            match e {
                IngestError::SharedResourcePathUnavailable { .. } => e,
                other => IngestError::SharedResourcePathUnavailable {
                    app_id: app_id.to_string(),
                    reason: other.to_string(),
                },
            }
        })?;

        let path = format!("{}{}", dir, raw);
        tracing::debug!(app_id, section = section.as_str(), path = %path, "Shared resource icon path");
        Ok(path)
    }

    fn is_verbatim(&self, section: IconSection, raw: &str) -> bool {
        raw.starts_with(&self.policy.system_prefix)
            || (section == IconSection::AccountSmall && raw == self.policy.legacy_small_icon)
    }
}

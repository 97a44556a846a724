//! Host platform collaborators
//!
//! The app manager reports where an installed app keeps its shared
//! resources; the package manager lists the apps a package contains. Both
//! are traits so the ingester can run against the real platform or the
//! config-backed implementations below.

use crate::config::{AppManagerConfig, IngestConfig};
use crate::{IngestError, Result};
use std::collections::BTreeMap;

/// App manager shared-resource directory lookup
pub trait SharedResourceLookup {
    /// Shared resource directory of an app, including any trailing separator
    fn shared_resource_path(&self, app_id: &str) -> Result<String>;
}

/// Package manager app enumeration
pub trait PackageAppList {
    /// IDs of the UI apps contained in a package
    fn app_ids(&self, package_id: &str) -> Result<Vec<String>>;
}

/// App manager driven by a directory template and per-app overrides
#[derive(Debug, Clone)]
pub struct StaticAppManager {
    template: String,
    overrides: BTreeMap<String, String>,
}

impl StaticAppManager {
    /// `template` has `{app_id}` substituted, e.g. `/opt/usr/apps/{app_id}/shared/res/`
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            overrides: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &AppManagerConfig) -> Self {
        Self {
            template: config.resource_template.clone(),
            overrides: config.overrides.clone(),
        }
    }

    pub fn with_override(mut self, app_id: impl Into<String>, dir: impl Into<String>) -> Self {
        self.overrides.insert(app_id.into(), dir.into());
        self
    }
}

impl SharedResourceLookup for StaticAppManager {
    fn shared_resource_path(&self, app_id: &str) -> Result<String> {
        if app_id.is_empty() {
            return Err(IngestError::SharedResourcePathUnavailable {
                app_id: String::new(),
                reason: "empty app ID".to_string(),
            });
        }

        if let Some(dir) = self.overrides.get(app_id) {
            return Ok(dir.clone());
        }

        if !self.template.contains("{app_id}") {
            return Err(IngestError::SharedResourcePathUnavailable {
                app_id: app_id.to_string(),
                reason: format!("template {} does not name the app", self.template),
            });
        }

        Ok(self.template.replace("{app_id}", app_id))
    }
}

/// Package registry backed by the `packages` config table
///
/// A package missing from the table is treated as a single-app package
/// whose app ID equals the package ID.
#[derive(Debug, Clone, Default)]
pub struct StaticPackageRegistry {
    packages: BTreeMap<String, Vec<String>>,
}

impl StaticPackageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self {
            packages: config.packages.clone(),
        }
    }

    pub fn with_package(mut self, package_id: impl Into<String>, app_ids: Vec<String>) -> Self {
        self.packages.insert(package_id.into(), app_ids);
        self
    }
}

impl PackageAppList for StaticPackageRegistry {
    fn app_ids(&self, package_id: &str) -> Result<Vec<String>> {
        if package_id.is_empty() {
            return Err(IngestError::Package("empty package ID".to_string()));
        }

        Ok(self
            .packages
            .get(package_id)
            .cloned()
            .unwrap_or_else(|| vec![package_id.to_string()]))
    }
}

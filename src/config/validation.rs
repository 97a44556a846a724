//! Configuration validation
//!
//! Checks an [`IngestConfig`] before any hook runs:
//! - Icon paths are absolute
//! - Built-in apps are unique and have a resource directory
//! - The app manager template names the app
//! - Every listed package contains at least one app

use super::ingest_config::IngestConfig;
use crate::IngestError;
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate an ingester configuration
pub fn validate_config(config: &IngestConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.database.path.as_os_str().is_empty() {
        errors.push(ValidationError::new(
            "database.path",
            "Database path cannot be empty",
        ));
    }

    if !config.icons.system_prefix.starts_with('/') {
        errors.push(ValidationError::new(
            "icons.system_prefix",
            format!("Must be an absolute path: {}", config.icons.system_prefix),
        ));
    }

    if !config.icons.legacy_small_icon.starts_with('/') {
        errors.push(ValidationError::new(
            "icons.legacy_small_icon",
            format!("Must be an absolute path: {}", config.icons.legacy_small_icon),
        ));
    }

    let mut seen = HashSet::new();
    for builtin in &config.icons.builtins {
        if builtin.app_id.is_empty() {
            errors.push(ValidationError::new(
                "icons.builtins",
                "Built-in app ID cannot be empty",
            ));
        } else if !seen.insert(builtin.app_id.as_str()) {
            errors.push(ValidationError::new(
                "icons.builtins",
                format!("Duplicate built-in app: {}", builtin.app_id),
            ));
        }

        if builtin.resource_dir.is_empty() {
            errors.push(ValidationError::new(
                "icons.builtins",
                format!("Resource directory of {} cannot be empty", builtin.app_id),
            ));
        }
    }

    if !config.app_manager.resource_template.contains("{app_id}") {
        errors.push(ValidationError::new(
            "app_manager.resource_template",
            format!(
                "Template must contain {{app_id}}: {}",
                config.app_manager.resource_template
            ),
        ));
    }

    for (package_id, apps) in &config.packages {
        if apps.is_empty() {
            errors.push(ValidationError::new(
                "packages",
                format!("Package {} lists no apps", package_id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate configuration and return a Result
pub fn validate_config_result(config: &IngestConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        IngestError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

//! Ingester configuration file handling
//!
//! Loads and manages the ~/.config/acctprov/config.yaml file.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Account database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite account database
    #[serde(default = "default_database_path")]
    pub path: PathBuf,

    /// Enable WAL mode
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

fn default_database_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("acctprov");
    path.push("account.db");
    path
}

fn default_wal_mode() -> bool {
    true
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

/// An app whose icons live in a fixed shared resource directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinApp {
    pub app_id: String,

    /// Directory prefix joined with the manifest icon value
    pub resource_dir: String,

    /// Whether the directory also applies to `account-small` icons
    #[serde(default = "default_true")]
    pub small_icon: bool,
}

fn default_true() -> bool {
    true
}

/// Icon path resolution policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconConfig {
    /// Icon values under this prefix are taken verbatim
    #[serde(default = "default_system_prefix")]
    pub system_prefix: String,

    /// A small icon value equal to this path is taken verbatim
    #[serde(default = "default_legacy_small_icon")]
    pub legacy_small_icon: String,

    #[serde(default = "default_builtins")]
    pub builtins: Vec<BuiltinApp>,
}

fn default_system_prefix() -> String {
    "/usr/share/icons".to_string()
}

fn default_legacy_small_icon() -> String {
    "/usr/apps/com.samsung.tizenaccount/shared/res/TizenAccount.png".to_string()
}

fn default_builtins() -> Vec<BuiltinApp> {
    vec![
        BuiltinApp {
            app_id: "com.samsung.samsungaccount".to_string(),
            resource_dir: "/usr/apps/com.samsung.samsungaccount/shared/res/".to_string(),
            small_icon: true,
        },
        BuiltinApp {
            app_id: "com.samsung.tizenaccount".to_string(),
            resource_dir: "/usr/apps/com.samsung.tizenaccount/shared/res/".to_string(),
            small_icon: false,
        },
    ]
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            system_prefix: default_system_prefix(),
            legacy_small_icon: default_legacy_small_icon(),
            builtins: default_builtins(),
        }
    }
}

/// Shared resource directories reported for installed apps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppManagerConfig {
    /// Directory template; `{app_id}` is substituted
    #[serde(default = "default_resource_template")]
    pub resource_template: String,

    /// Per-app directories that bypass the template
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

fn default_resource_template() -> String {
    "/opt/usr/apps/{app_id}/shared/res/".to_string()
}

impl Default for AppManagerConfig {
    fn default() -> Self {
        Self {
            resource_template: default_resource_template(),
            overrides: BTreeMap::new(),
        }
    }
}

/// acctprov configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub icons: IconConfig,

    #[serde(default)]
    pub app_manager: AppManagerConfig,

    /// Package ID -> UI app IDs contained in the package
    #[serde(default)]
    pub packages: BTreeMap<String, Vec<String>>,
}

impl IngestConfig {
    /// Create a configuration with every default
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::IngestError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading acctprov configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;

        tracing::debug!(
            database = %config.database.path.display(),
            builtins = config.icons.builtins.len(),
            packages = config.packages.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load from the default path, falling back to defaults when no file exists
    pub fn load_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::new())
        }
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving acctprov configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/acctprov/config.yaml)
    pub fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("acctprov");
        path.push("config.yaml");
        path
    }

    /// Register the apps contained in a package
    pub fn add_package(&mut self, package_id: impl Into<String>, app_ids: Vec<String>) {
        self.packages.insert(package_id.into(), app_ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_defaults() {
        let config = IngestConfig::new();
        assert_eq!(config.icons.system_prefix, "/usr/share/icons");
        assert_eq!(config.icons.builtins.len(), 2);
        assert!(config.database.wal_mode);
        assert!(config.database.path.ends_with("acctprov/account.db"));
        assert!(config.packages.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let mut config = IngestConfig::new();
        config.add_package(
            "org.example",
            vec!["org.example.mail".to_string(), "org.example.chat".to_string()],
        );
        config
            .app_manager
            .overrides
            .insert("org.example.mail".to_string(), "/srv/mail/res/".to_string());
        config.save(path).unwrap();

        let loaded = IngestConfig::load(path).unwrap();
        assert_eq!(loaded.packages["org.example"].len(), 2);
        assert_eq!(loaded.app_manager.overrides["org.example.mail"], "/srv/mail/res/");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
database:
  path: /tmp/acct.db
packages:
  org.example: [org.example.mail]
"#;
        let config: IngestConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/acct.db"));
        assert!(config.database.wal_mode);
        assert_eq!(config.icons.legacy_small_icon, default_legacy_small_icon());
        assert_eq!(config.app_manager.resource_template, default_resource_template());
    }

    #[test]
    fn test_builtin_small_icon_defaults_true() {
        let yaml = r#"
icons:
  builtins:
    - app_id: org.example.builtin
      resource_dir: /usr/apps/org.example.builtin/shared/res/
"#;
        let config: IngestConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.icons.builtins[0].small_icon);
        assert_eq!(config.icons.system_prefix, "/usr/share/icons");
    }

    #[test]
    fn test_load_missing_file() {
        let result = IngestConfig::load("/nonexistent/config.yaml");
        assert!(matches!(result, Err(crate::IngestError::Config(_))));
    }

    #[test]
    fn test_default_path() {
        let path = IngestConfig::default_path();
        assert!(path.ends_with("acctprov/config.yaml"));
    }
}

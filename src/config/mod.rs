//! Configuration system
//!
//! Loads ~/.config/acctprov/config.yaml with support for:
//! - Account database location
//! - Icon path resolution policy (system prefix, built-in apps)
//! - App manager shared resource directories
//! - Package to app mappings used by uninstall and pre-upgrade

mod ingest_config;
pub mod validation;

pub use ingest_config::{AppManagerConfig, BuiltinApp, DatabaseConfig, IconConfig, IngestConfig};
pub use validation::{validate_config, validate_config_result, ValidationError};

//! Error types for acctprov
//!
//! Every manifest, resolver, and store failure maps onto one variant of
//! [`IngestError`]. Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for ingester operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Failures reported by the account store
#[derive(Error, Debug)]
pub enum StoreError {
    /// The target app ID has no registered provider type
    #[error("The application does not register the account provider: {0}")]
    NotRegisteredProvider(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("{0}")]
    Other(String),
}

impl From<account_db::Error> for StoreError {
    fn from(e: account_db::Error) -> Self {
        match e {
            account_db::Error::NotRegisteredProvider(app_id) => {
                StoreError::NotRegisteredProvider(app_id)
            }
            account_db::Error::PermissionDenied(msg) => StoreError::PermissionDenied(msg),
            account_db::Error::RecordNotFound(msg) => StoreError::RecordNotFound(msg),
            other => StoreError::Other(other.to_string()),
        }
    }
}

/// Error type for manifest ingestion
#[derive(Error, Debug)]
pub enum IngestError {
    /// Document is not well-formed or has no element under its root
    #[error("Malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("Manifest has no <account-provider> element")]
    ProviderNodeMissing,

    #[error("<account-provider> is missing the appid attribute")]
    MissingAppId,

    #[error("<account-provider> is missing the multiple-accounts-support attribute")]
    MissingMultiAccountFlag,

    #[error("<icon> is missing the section attribute")]
    MissingIconSection,

    #[error("<icon section=\"{0}\"> has no value")]
    MissingIconValue(String),

    #[error("<label> has no value")]
    MissingLabelValue,

    #[error("<capability> has no value")]
    MissingCapabilityValue,

    /// The app manager could not report the app's shared resource directory
    #[error("Shared resource path unavailable for {app_id}: {reason}")]
    SharedResourcePathUnavailable { app_id: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Package manager could not list the apps of a package
    #[error("Package error: {0}")]
    Package(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl From<account_db::Error> for IngestError {
    fn from(e: account_db::Error) -> Self {
        IngestError::Store(e.into())
    }
}

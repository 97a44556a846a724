//! acctprov - Account Provider Manifest Ingester
//!
//! Registers packages as account providers. At install time the package's
//! manifest is parsed into an [`AccountProviderRecord`] and written to the
//! account database; uninstall and upgrade remove or migrate what was
//! registered.
//!
//! # Architecture
//!
//! - **manifest**: XML element tree and the `<account-provider>` parser
//! - **resolver**: Icon path resolution policy
//! - **host**: App manager and package manager collaborators
//! - **store**: Account store capability and its SQLite backend
//! - **ingest**: Build-then-write ingestion over a store
//! - **hooks**: Package manager entry points and status codes
//! - **config**: YAML configuration and validation

pub mod config;
pub mod error;
pub mod hooks;
pub mod host;
pub mod ingest;
pub mod logging;
pub mod manifest;
pub mod resolver;
pub mod store;

// Re-exports
pub use error::{IngestError, Result, StoreError};
pub use hooks::PackageHooks;
pub use ingest::{Ingester, PreUpgrade};
pub use manifest::AccountProviderRecord;

//! Manifest ingestion
//!
//! The [`Ingester`] turns a manifest document into a provider record and
//! applies it to the account store. A record is always built completely
//! (parsed and every icon resolved) before the single store write, so a
//! failing manifest never leaves a partial provider type behind.

use crate::config::IconConfig;
use crate::host::{PackageAppList, SharedResourceLookup};
use crate::manifest::{self, AccountProviderRecord, Element};
use crate::resolver::IconResolver;
use crate::store::AccountStore;
use crate::Result;

/// State carried from pre-upgrade into the following upgrade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreUpgrade {
    /// App ID whose provider type was removed before the upgrade
    pub previous_app_id: Option<String>,
}

impl PreUpgrade {
    pub fn new(previous_app_id: Option<String>) -> Self {
        Self { previous_app_id }
    }
}

/// Account provider ingester over a store and the host collaborators
pub struct Ingester<S, A, P> {
    store: S,
    apps: A,
    packages: P,
    icons: IconConfig,
}

impl<S, A, P> Ingester<S, A, P>
where
    S: AccountStore,
    A: SharedResourceLookup,
    P: PackageAppList,
{
    pub fn new(store: S, apps: A, packages: P, icons: IconConfig) -> Self {
        Self {
            store,
            apps,
            packages,
            icons,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Parse a document and resolve its icons without touching the store
    pub fn build_record(&self, document: &Element) -> Result<AccountProviderRecord> {
        let resolver = IconResolver::new(&self.icons, &self.apps);
        manifest::parse_root(document, &resolver)
    }

    /// Build a record and write it to the store
    pub fn register(&self, document: &Element) -> Result<AccountProviderRecord> {
        tracing::debug!("Registering the account provider");

        let record = self.build_record(document)?;
        self.store.insert_provider_type(&record)?;

        tracing::info!(
            app_id = %record.app_id,
            labels = record.labels.len(),
            capabilities = record.capabilities.len(),
            "Account provider registered"
        );
        Ok(record)
    }

    /// Remove the provider types of every app in a package
    ///
    /// Returns the last app that actually had a provider type registered.
    pub fn remove_provider_types(&self, package_id: &str) -> Result<Option<String>> {
        let mut removed_app = None;

        for app_id in self.packages.app_ids(package_id)? {
            let removed = self.store.delete_provider_types_by_app_id(&app_id)?;
            if removed > 0 {
                tracing::debug!(package_id, app_id = %app_id, "Removed provider type");
                if let Some(previous) = removed_app.replace(app_id) {
                    tracing::warn!(package_id, previous = %previous, "Package had more than one provider");
                }
            }
        }

        Ok(removed_app)
    }

    /// Remove the accounts and provider types of every app in a package
    pub fn unregister_package(&self, package_id: &str) -> Result<()> {
        tracing::debug!(package_id, "Unregistering the account provider");

        for app_id in self.packages.app_ids(package_id)? {
            let accounts = self.store.delete_accounts_by_package_name(&app_id)?;
            let providers = self.store.delete_provider_types_by_app_id(&app_id)?;
            tracing::info!(package_id, app_id = %app_id, accounts, providers, "App unregistered");
        }

        Ok(())
    }

    /// Move accounts from the previous provider app to the newly registered one
    pub fn migrate_accounts(&self, previous: &PreUpgrade, new_app_id: &str) -> Result<usize> {
        match previous.previous_app_id.as_deref() {
            Some(old_app_id) if old_app_id != new_app_id => {
                self.store.reassign_accounts_package_name(old_app_id, new_app_id)
            }
            _ => Ok(0),
        }
    }
}

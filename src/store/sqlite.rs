//! SqliteStore - AccountStore over the account-db crate

use super::AccountStore;
use crate::config::DatabaseConfig;
use crate::manifest::AccountProviderRecord;
use crate::{IngestError, Result};
use account_db::{AccountDb, DbConfig, ProviderType};

/// Account store backed by the SQLite account database
pub struct SqliteStore {
    db: AccountDb,
}

impl SqliteStore {
    /// Open or create the database named in the configuration
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        let db = AccountDb::open(DbConfig {
            path: config.path.clone(),
            wal_mode: config.wal_mode,
            read_only: false,
        })?;
        Ok(Self { db })
    }

    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            db: AccountDb::open_in_memory()?,
        })
    }

    pub fn from_db(db: AccountDb) -> Self {
        Self { db }
    }

    /// Underlying database, for account management outside the hooks
    pub fn db(&self) -> &AccountDb {
        &self.db
    }
}

/// Map "record not found" to zero affected rows
fn benign_not_found(result: account_db::Result<usize>) -> Result<usize> {
    match result {
        Ok(n) => Ok(n),
        Err(account_db::Error::RecordNotFound(what)) => {
            tracing::debug!(%what, "Nothing to remove");
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

impl AccountStore for SqliteStore {
    fn insert_provider_type(&self, record: &AccountProviderRecord) -> Result<i64> {
        let id = self.db.insert_provider_type(&record_to_provider_type(record))?;
        tracing::info!(app_id = %record.app_id, id, "Provider type stored");
        Ok(id)
    }

    fn delete_provider_types_by_app_id(&self, app_id: &str) -> Result<usize> {
        benign_not_found(self.db.delete_provider_types_by_app_id(app_id))
    }

    fn delete_accounts_by_package_name(&self, package_name: &str) -> Result<usize> {
        benign_not_found(self.db.delete_accounts_by_package_name(package_name))
    }

    fn query_accounts_by_package_name(
        &self,
        package_name: &str,
        callback: &mut dyn FnMut(i64) -> Result<()>,
    ) -> Result<usize> {
        let mut failure: Option<IngestError> = None;

        let visited = self
            .db
            .query_accounts_by_package_name(package_name, |account| match callback(account.id) {
                Ok(()) => true,
                Err(e) => {
                    tracing::error!(account_id = account.id, error = %e, "Account callback failed");
                    failure = Some(e);
                    false
                }
            });
        let visited = benign_not_found(visited)?;

        match failure {
            Some(e) => Err(e),
            None => Ok(visited),
        }
    }

    fn update_account_package_name(&self, account_id: i64, package_name: &str) -> Result<()> {
        self.db.update_account_package_name(account_id, package_name)?;
        Ok(())
    }

    fn provider_type(&self, app_id: &str) -> Result<Option<AccountProviderRecord>> {
        Ok(self.db.provider_type(app_id)?.map(provider_type_to_record))
    }

    fn provider_types(&self) -> Result<Vec<AccountProviderRecord>> {
        Ok(self
            .db
            .provider_types()?
            .into_iter()
            .map(provider_type_to_record)
            .collect())
    }
}

fn record_to_provider_type(record: &AccountProviderRecord) -> ProviderType {
    let mut provider = ProviderType::new(&record.app_id);
    provider.service_provider_id = record.provider_id.clone();
    provider.multiple_account_support = record.multiple_accounts_supported;
    provider.icon_path = record.icon_path.clone();
    provider.small_icon_path = record.small_icon_path.clone();
    for (locale, label) in &record.labels {
        provider.add_label(locale, label);
    }
    for capability in &record.capabilities {
        provider.add_feature(capability);
    }
    provider
}

fn provider_type_to_record(provider: ProviderType) -> AccountProviderRecord {
    AccountProviderRecord {
        app_id: provider.app_id,
        provider_id: provider.service_provider_id,
        multiple_accounts_supported: provider.multiple_account_support,
        icon_path: provider.icon_path,
        small_icon_path: provider.small_icon_path,
        labels: provider
            .labels
            .into_iter()
            .map(|l| (l.locale, l.label))
            .collect(),
        capabilities: provider.features.into_iter().collect(),
    }
}

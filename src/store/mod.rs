//! Account store layer
//!
//! [`AccountStore`] is the capability the ingester writes through. Lookups
//! and deletes key on app ID only. Deleting or querying something that does
//! not exist succeeds with a count of zero.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::manifest::AccountProviderRecord;
use crate::Result;

/// Storage of provider types and the accounts they own
pub trait AccountStore {
    /// Register a provider type, returning its row ID
    fn insert_provider_type(&self, record: &AccountProviderRecord) -> Result<i64>;

    /// Remove the provider type of an app; returns how many rows were removed
    fn delete_provider_types_by_app_id(&self, app_id: &str) -> Result<usize>;

    /// Remove every account owned by a package
    fn delete_accounts_by_package_name(&self, package_name: &str) -> Result<usize>;

    /// Call `callback` with the ID of each account owned by a package
    ///
    /// Stops at and returns the first callback error.
    fn query_accounts_by_package_name(
        &self,
        package_name: &str,
        callback: &mut dyn FnMut(i64) -> Result<()>,
    ) -> Result<usize>;

    /// Move one account to another (registered) provider package
    fn update_account_package_name(&self, account_id: i64, package_name: &str) -> Result<()>;

    /// Provider type registered for an app, if any
    fn provider_type(&self, app_id: &str) -> Result<Option<AccountProviderRecord>>;

    /// All registered provider types
    fn provider_types(&self) -> Result<Vec<AccountProviderRecord>>;

    /// Move every account of `old_app_id` to `new_app_id`
    ///
    /// The first account that fails to move aborts the migration.
    fn reassign_accounts_package_name(&self, old_app_id: &str, new_app_id: &str) -> Result<usize> {
        let mut moved = 0;
        self.query_accounts_by_package_name(old_app_id, &mut |account_id| {
            self.update_account_package_name(account_id, new_app_id)?;
            moved += 1;
            Ok(())
        })?;

        tracing::info!(old_app_id, new_app_id, moved, "Reassigned accounts");
        Ok(moved)
    }
}

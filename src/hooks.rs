//! Package manager hook entry points
//!
//! The package manager drives a plugin through four callbacks. They are
//! modeled here as [`PackageHooks`], and [`status_code`] maps their results
//! to the integer status the host expects.
//!
//! Pre-upgrade hands its state to upgrade explicitly:
//!
//! ```no_run
//! # use acctprov::hooks::PackageHooks;
//! # fn demo(hooks: &impl PackageHooks, doc: &acctprov::manifest::Element) -> acctprov::Result<()> {
//! let previous = hooks.pre_upgrade("org.example")?;
//! hooks.upgrade(doc, "org.example", &previous)?;
//! # Ok(())
//! # }
//! ```

use crate::host::{PackageAppList, SharedResourceLookup};
use crate::ingest::{Ingester, PreUpgrade};
use crate::manifest::Element;
use crate::store::AccountStore;
use crate::Result;

/// Status returned to the host on success
pub const STATUS_OK: i32 = 0;

/// Status returned to the host on any failure
pub const STATUS_FAILED: i32 = -1;

/// The four package manager callbacks
pub trait PackageHooks {
    /// Register the provider described by a newly installed package
    fn install(&self, document: &Element, package_id: &str) -> Result<()>;

    /// Remove provider registrations ahead of an upgrade
    fn pre_upgrade(&self, package_id: &str) -> Result<PreUpgrade>;

    /// Register the upgraded provider and move accounts over from the previous one
    fn upgrade(&self, document: &Element, package_id: &str, previous: &PreUpgrade) -> Result<()>;

    /// Remove the accounts and provider registrations of a package
    fn uninstall(&self, package_id: &str) -> Result<()>;
}

impl<S, A, P> PackageHooks for Ingester<S, A, P>
where
    S: AccountStore,
    A: SharedResourceLookup,
    P: PackageAppList,
{
    fn install(&self, document: &Element, package_id: &str) -> Result<()> {
        tracing::info!(package_id, "Install hook");
        self.register(document)?;
        Ok(())
    }

    fn pre_upgrade(&self, package_id: &str) -> Result<PreUpgrade> {
        tracing::info!(package_id, "Pre-upgrade hook");
        let previous_app_id = self.remove_provider_types(package_id)?;
        Ok(PreUpgrade::new(previous_app_id))
    }

    fn upgrade(&self, document: &Element, package_id: &str, previous: &PreUpgrade) -> Result<()> {
        tracing::info!(
            package_id,
            previous_app_id = ?previous.previous_app_id,
            "Upgrade hook"
        );
        let record = self.register(document)?;
        self.migrate_accounts(previous, &record.app_id)?;
        Ok(())
    }

    fn uninstall(&self, package_id: &str) -> Result<()> {
        tracing::info!(package_id, "Uninstall hook");
        self.unregister_package(package_id)
    }
}

/// Map a hook result to the host status code, logging any failure
pub fn status_code<T>(hook: &str, result: &Result<T>) -> i32 {
    match result {
        Ok(_) => STATUS_OK,
        Err(e) => {
            tracing::error!(hook, error = %e, "Hook failed");
            STATUS_FAILED
        }
    }
}

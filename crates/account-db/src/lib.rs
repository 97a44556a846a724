//! SQLite account database
//!
//! Stores account provider types (with their labels and provider features)
//! and the user accounts owned by provider packages.
//!
//! # Example
//!
//! ```no_run
//! use account_db::{AccountDb, DbConfig, NewAccount, ProviderType};
//!
//! let db = AccountDb::open(DbConfig::new("/tmp/account.db"))?;
//!
//! let mut provider = ProviderType::new("org.example.mail");
//! provider.multiple_account_support = true;
//! provider.add_label("en_US", "Example Mail");
//! db.insert_provider_type(&provider)?;
//!
//! db.insert_account(&NewAccount::new("alice", "org.example.mail"))?;
//! # Ok::<(), account_db::Error>(())
//! ```

use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors returned by the account database
#[derive(Error, Debug)]
pub enum Error {
    #[error("The application does not register the account provider: {0}")]
    NotRegisteredProvider(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Database error: {0}")]
    Database(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::ReadOnly)
            | Some(ErrorCode::PermissionDenied)
            | Some(ErrorCode::AuthorizationForStatementDenied) => {
                Error::PermissionDenied(e.to_string())
            }
            _ => Error::Database(e),
        }
    }
}

/// Result type for account database operations
pub type Result<T> = std::result::Result<T, Error>;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to SQLite database file
    pub path: PathBuf,

    /// Enable WAL mode
    pub wal_mode: bool,

    /// Open without write access
    pub read_only: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            wal_mode: true,
            read_only: false,
        }
    }
}

/// A localized display label of a provider type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub locale: String,
    pub label: String,
}

/// An account provider type row with its labels and features
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderType {
    /// Row ID (0 until stored)
    pub id: i64,
    pub app_id: String,
    pub service_provider_id: Option<String>,
    pub multiple_account_support: bool,
    pub icon_path: Option<String>,
    pub small_icon_path: Option<String>,
    pub labels: Vec<Label>,
    pub features: Vec<String>,
}

impl ProviderType {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Default::default()
        }
    }

    pub fn add_label(&mut self, locale: impl Into<String>, label: impl Into<String>) {
        self.labels.push(Label {
            locale: locale.into(),
            label: label.into(),
        });
    }

    pub fn add_feature(&mut self, feature: impl Into<String>) {
        self.features.push(feature.into());
    }

    /// Label for a locale, if registered
    pub fn label(&self, locale: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.locale == locale)
            .map(|l| l.label.as_str())
    }
}

/// A stored user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub user_name: String,
    pub display_name: Option<String>,
    /// App ID of the owning provider package
    pub package_name: String,
    pub created_at: String,
}

/// A user account to be inserted
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_name: String,
    pub display_name: Option<String>,
    pub package_name: String,
}

impl NewAccount {
    pub fn new(user_name: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            display_name: None,
            package_name: package_name.into(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }
}

/// SQLite account database
pub struct AccountDb {
    conn: Connection,
    config: DbConfig,
}

impl AccountDb {
    /// Open or create an account database
    pub fn open(config: DbConfig) -> Result<Self> {
        let conn = if config.read_only {
            tracing::info!(path = %config.path.display(), "Opening account database read-only");
            Connection::open_with_flags(&config.path, OpenFlags::SQLITE_OPEN_READ_ONLY)?
        } else {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %config.path.display(), "Opening account database");
            let conn = Connection::open(&config.path)?;
            if config.wal_mode {
                conn.pragma_update(None, "journal_mode", "WAL")?;
            }
            conn
        };

        let db = Self { conn, config };
        if !db.config.read_only {
            db.init_schema()?;
        }

        Ok(db)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            config: DbConfig {
                path: PathBuf::from(":memory:"),
                wal_mode: false,
                read_only: false,
            },
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS account_type (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                app_id TEXT NOT NULL UNIQUE,
                service_provider_id TEXT,
                multiple_account_support INTEGER NOT NULL DEFAULT 0,
                icon_path TEXT,
                small_icon_path TEXT
            );

            CREATE TABLE IF NOT EXISTS label (
                app_id TEXT NOT NULL,
                locale TEXT NOT NULL,
                label TEXT NOT NULL,
                PRIMARY KEY (app_id, locale)
            );

            CREATE TABLE IF NOT EXISTS provider_feature (
                app_id TEXT NOT NULL,
                key TEXT NOT NULL,
                PRIMARY KEY (app_id, key)
            );

            CREATE TABLE IF NOT EXISTS account (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_name TEXT NOT NULL,
                display_name TEXT,
                package_name TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_account_package ON account(package_name);
            "#,
        )?;

        Ok(())
    }

    /// Insert a provider type, replacing any row already registered for its app ID
    pub fn insert_provider_type(&self, provider: &ProviderType) -> Result<i64> {
        tracing::debug!(app_id = %provider.app_id, "Inserting provider type");

        let tx = self.conn.unchecked_transaction()?;

        delete_provider_type_rows(&tx, &provider.app_id)?;

        tx.execute(
            r#"
            INSERT INTO account_type (
                app_id, service_provider_id, multiple_account_support,
                icon_path, small_icon_path
            ) VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                &provider.app_id,
                provider.service_provider_id.as_deref(),
                provider.multiple_account_support,
                provider.icon_path.as_deref(),
                provider.small_icon_path.as_deref(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        for label in &provider.labels {
            tx.execute(
                "INSERT OR REPLACE INTO label (app_id, locale, label) VALUES (?, ?, ?)",
                params![&provider.app_id, &label.locale, &label.label],
            )?;
        }

        for feature in &provider.features {
            tx.execute(
                "INSERT OR IGNORE INTO provider_feature (app_id, key) VALUES (?, ?)",
                params![&provider.app_id, feature],
            )?;
        }

        tx.commit()?;

        Ok(id)
    }

    /// Delete the provider type registered for an app ID
    ///
    /// Returns `RecordNotFound` when nothing was registered.
    pub fn delete_provider_types_by_app_id(&self, app_id: &str) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = delete_provider_type_rows(&tx, app_id)?;
        tx.commit()?;

        if removed == 0 {
            return Err(Error::RecordNotFound(format!("provider type {}", app_id)));
        }
        Ok(removed)
    }

    /// Look up the provider type registered for an app ID
    pub fn provider_type(&self, app_id: &str) -> Result<Option<ProviderType>> {
        let provider = self
            .conn
            .query_row(
                r#"
                SELECT id, app_id, service_provider_id, multiple_account_support,
                       icon_path, small_icon_path
                FROM account_type WHERE app_id = ?
                "#,
                [app_id],
                row_to_provider_type,
            )
            .optional()?;

        match provider {
            Some(mut provider) => {
                self.load_provider_details(&mut provider)?;
                Ok(Some(provider))
            }
            None => Ok(None),
        }
    }

    /// All registered provider types, ordered by app ID
    pub fn provider_types(&self) -> Result<Vec<ProviderType>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, app_id, service_provider_id, multiple_account_support,
                   icon_path, small_icon_path
            FROM account_type ORDER BY app_id
            "#,
        )?;

        let rows = stmt.query_map([], row_to_provider_type)?;
        let mut providers = Vec::new();
        for row in rows {
            let mut provider = row?;
            self.load_provider_details(&mut provider)?;
            providers.push(provider);
        }

        Ok(providers)
    }

    fn load_provider_details(&self, provider: &mut ProviderType) -> Result<()> {
        let mut label_stmt = self
            .conn
            .prepare("SELECT locale, label FROM label WHERE app_id = ? ORDER BY locale")?;
        let labels = label_stmt.query_map([&provider.app_id], |row| {
            Ok(Label {
                locale: row.get(0)?,
                label: row.get(1)?,
            })
        })?;
        for label in labels {
            provider.labels.push(label?);
        }

        let mut feature_stmt = self
            .conn
            .prepare("SELECT key FROM provider_feature WHERE app_id = ? ORDER BY key")?;
        let features = feature_stmt.query_map([&provider.app_id], |row| row.get::<_, String>(0))?;
        for feature in features {
            provider.features.push(feature?);
        }

        Ok(())
    }

    /// Insert a user account owned by a registered provider package
    pub fn insert_account(&self, account: &NewAccount) -> Result<i64> {
        self.ensure_registered(&account.package_name)?;

        self.conn.execute(
            r#"
            INSERT INTO account (user_name, display_name, package_name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
            params![
                &account.user_name,
                account.display_name.as_deref(),
                &account.package_name,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Accounts owned by a package (empty when there are none)
    pub fn accounts_by_package_name(&self, package_name: &str) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_name, display_name, package_name, created_at
            FROM account WHERE package_name = ? ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([package_name], |row| {
            Ok(Account {
                id: row.get(0)?,
                user_name: row.get(1)?,
                display_name: row.get(2)?,
                package_name: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut accounts = Vec::new();
        for account in rows {
            accounts.push(account?);
        }
        Ok(accounts)
    }

    /// Visit each account owned by a package until the callback returns `false`
    ///
    /// Returns the number of accounts visited, or `RecordNotFound` when the
    /// package owns no accounts.
    pub fn query_accounts_by_package_name<F>(&self, package_name: &str, mut callback: F) -> Result<usize>
    where
        F: FnMut(&Account) -> bool,
    {
        let accounts = self.accounts_by_package_name(package_name)?;
        if accounts.is_empty() {
            return Err(Error::RecordNotFound(format!("accounts of {}", package_name)));
        }

        let mut visited = 0;
        for account in &accounts {
            visited += 1;
            if !callback(account) {
                break;
            }
        }
        Ok(visited)
    }

    /// Move an account to another provider package
    pub fn update_account_package_name(&self, account_id: i64, package_name: &str) -> Result<()> {
        self.ensure_registered(package_name)?;

        let updated = self.conn.execute(
            "UPDATE account SET package_name = ? WHERE id = ?",
            params![package_name, account_id],
        )?;

        if updated == 0 {
            return Err(Error::RecordNotFound(format!("account {}", account_id)));
        }
        Ok(())
    }

    /// Delete all accounts owned by a package
    ///
    /// Returns `RecordNotFound` when the package owns no accounts.
    pub fn delete_accounts_by_package_name(&self, package_name: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM account WHERE package_name = ?", [package_name])?;

        if removed == 0 {
            return Err(Error::RecordNotFound(format!("accounts of {}", package_name)));
        }
        Ok(removed)
    }

    fn ensure_registered(&self, app_id: &str) -> Result<()> {
        let registered: Option<i64> = self
            .conn
            .query_row("SELECT id FROM account_type WHERE app_id = ?", [app_id], |row| {
                row.get(0)
            })
            .optional()?;

        if registered.is_none() {
            return Err(Error::NotRegisteredProvider(app_id.to_string()));
        }
        Ok(())
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.config.path
    }
}

fn delete_provider_type_rows(conn: &Connection, app_id: &str) -> Result<usize> {
    conn.execute("DELETE FROM label WHERE app_id = ?", [app_id])?;
    conn.execute("DELETE FROM provider_feature WHERE app_id = ?", [app_id])?;
    let removed = conn.execute("DELETE FROM account_type WHERE app_id = ?", [app_id])?;
    Ok(removed)
}

fn row_to_provider_type(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProviderType> {
    Ok(ProviderType {
        id: row.get(0)?,
        app_id: row.get(1)?,
        service_provider_id: row.get(2)?,
        multiple_account_support: row.get(3)?,
        icon_path: row.get(4)?,
        small_icon_path: row.get(5)?,
        labels: Vec::new(),
        features: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mail_provider() -> ProviderType {
        let mut provider = ProviderType::new("org.example.mail");
        provider.service_provider_id = Some("http://example.org/mail".to_string());
        provider.multiple_account_support = true;
        provider.icon_path = Some("/usr/share/icons/mail.png".to_string());
        provider.add_label("default", "Mail");
        provider.add_label("en_US", "Example Mail");
        provider.add_feature("http://tizen.org/account/capability/email");
        provider
    }

    #[test]
    fn test_open_creates_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("account.db");

        let db = AccountDb::open(DbConfig::new(&path)).unwrap();
        assert!(db.path().exists());
    }

    #[test]
    fn test_insert_and_load_provider_type() {
        let db = AccountDb::open_in_memory().unwrap();
        let id = db.insert_provider_type(&mail_provider()).unwrap();
        assert!(id > 0);

        let loaded = db.provider_type("org.example.mail").unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert!(loaded.multiple_account_support);
        assert_eq!(loaded.service_provider_id.as_deref(), Some("http://example.org/mail"));
        assert_eq!(loaded.label("en_US"), Some("Example Mail"));
        assert_eq!(loaded.label("default"), Some("Mail"));
        assert_eq!(loaded.features.len(), 1);
    }

    #[test]
    fn test_insert_replaces_existing_registration() {
        let db = AccountDb::open_in_memory().unwrap();
        db.insert_provider_type(&mail_provider()).unwrap();

        let mut updated = ProviderType::new("org.example.mail");
        updated.add_label("default", "Mail v2");
        db.insert_provider_type(&updated).unwrap();

        let providers = db.provider_types().unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].labels.len(), 1);
        assert_eq!(providers[0].label("default"), Some("Mail v2"));
        assert!(providers[0].features.is_empty());
    }

    #[test]
    fn test_delete_provider_type_not_found() {
        let db = AccountDb::open_in_memory().unwrap();
        let result = db.delete_provider_types_by_app_id("org.example.none");
        assert!(matches!(result, Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn test_delete_provider_type() {
        let db = AccountDb::open_in_memory().unwrap();
        db.insert_provider_type(&mail_provider()).unwrap();

        assert_eq!(db.delete_provider_types_by_app_id("org.example.mail").unwrap(), 1);
        assert!(db.provider_type("org.example.mail").unwrap().is_none());
    }

    #[test]
    fn test_account_requires_registered_provider() {
        let db = AccountDb::open_in_memory().unwrap();
        let result = db.insert_account(&NewAccount::new("alice", "org.example.mail"));
        assert!(matches!(result, Err(Error::NotRegisteredProvider(_))));
    }

    #[test]
    fn test_query_accounts_stops_when_callback_declines() {
        let db = AccountDb::open_in_memory().unwrap();
        db.insert_provider_type(&mail_provider()).unwrap();
        db.insert_account(&NewAccount::new("alice", "org.example.mail")).unwrap();
        db.insert_account(&NewAccount::new("bob", "org.example.mail").with_display_name("Bob"))
            .unwrap();

        let visited = db
            .query_accounts_by_package_name("org.example.mail", |_| false)
            .unwrap();
        assert_eq!(visited, 1);

        let result = db.query_accounts_by_package_name("org.example.other", |_| true);
        assert!(matches!(result, Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn test_update_account_package_name() {
        let db = AccountDb::open_in_memory().unwrap();
        db.insert_provider_type(&mail_provider()).unwrap();
        let id = db.insert_account(&NewAccount::new("alice", "org.example.mail")).unwrap();

        let result = db.update_account_package_name(id, "org.example.mail2");
        assert!(matches!(result, Err(Error::NotRegisteredProvider(_))));

        db.insert_provider_type(&ProviderType::new("org.example.mail2")).unwrap();
        db.update_account_package_name(id, "org.example.mail2").unwrap();

        let moved = db.accounts_by_package_name("org.example.mail2").unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].user_name, "alice");
    }

    #[test]
    fn test_delete_accounts_by_package_name() {
        let db = AccountDb::open_in_memory().unwrap();
        db.insert_provider_type(&mail_provider()).unwrap();
        db.insert_account(&NewAccount::new("alice", "org.example.mail")).unwrap();

        assert_eq!(db.delete_accounts_by_package_name("org.example.mail").unwrap(), 1);
        let result = db.delete_accounts_by_package_name("org.example.mail");
        assert!(matches!(result, Err(Error::RecordNotFound(_))));
    }

    #[test]
    fn test_read_only_write_is_permission_denied() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("account.db");

        {
            let mut config = DbConfig::new(&path);
            config.wal_mode = false;
            AccountDb::open(config).unwrap();
        }

        let mut config = DbConfig::new(&path);
        config.read_only = true;
        let db = AccountDb::open(config).unwrap();

        let result = db.insert_provider_type(&mail_provider());
        assert!(matches!(result, Err(Error::PermissionDenied(_))));
    }
}

// SQLite database for token and bundle storage
use crate::errors::StoreError;
use crate::logger::{self, LogTag};
use crate::storage::StoreResult;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Shared SQLite handle implementing both stores
///
/// Queries run on tokio's blocking pool; the mutex is never held across an await.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

/// Configure a file-backed connection for concurrency
fn configure_database_connection(connection: &Connection) -> Result<(), rusqlite::Error> {
    // journal_mode returns the resulting mode as a row
    connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    })?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    connection.pragma_update(None, "temp_store", "memory")?;
    connection.busy_timeout(std::time::Duration::from_millis(30_000))?;
    Ok(())
}

fn create_schema(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS tokens (
            address TEXT PRIMARY KEY COLLATE NOCASE,
            name TEXT NOT NULL,
            symbol TEXT NOT NULL,
            decimals INTEGER NOT NULL DEFAULT 0,
            price REAL NOT NULL DEFAULT 0,
            logo_uri TEXT,
            last_updated TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS bundles (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            image_url TEXT,
            token_addresses TEXT NOT NULL,
            initial_price REAL NOT NULL DEFAULT 0,
            current_price REAL NOT NULL DEFAULT 0,
            price_change_percent REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            last_updated TEXT NOT NULL,
            user_id TEXT,
            twitter_username TEXT,
            is_active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            twitter_username TEXT,
            twitter_profile_image_url TEXT,
            email TEXT,
            display_name TEXT,
            solana_address TEXT,
            total_rewards REAL NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            last_login_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_bundles_user_id ON bundles(user_id);
        CREATE INDEX IF NOT EXISTS idx_bundles_created_at ON bundles(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_bundles_performance ON bundles(price_change_percent DESC);
        CREATE INDEX IF NOT EXISTS idx_users_twitter ON users(twitter_username COLLATE NOCASE);",
    )
}

impl Database {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::InvalidValue {
                    column: "path",
                    value: format!("{}: {}", parent.display(), e),
                })?;
            }
        }

        let connection = Connection::open(path)?;
        configure_database_connection(&connection)?;
        create_schema(&connection)?;

        logger::info(
            LogTag::Database,
            &format!("Database ready at {}", path.display()),
        );

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Private in-memory database (tests, dry runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        let connection = Connection::open_in_memory()?;
        create_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Run `f` with the locked connection on the blocking pool
    pub(crate) async fn with_connection<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let conn = connection
                .lock()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering
pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(column: &'static str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidValue {
            column,
            value: value.to_string(),
        })
}

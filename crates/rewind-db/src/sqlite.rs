//! `SQLite` connection handling for the history store.
//!
//! The replay writes through a single connection: ingestion is strictly
//! sequential, and `SQLite` allows only one writer at a time anyway. The
//! finished file is opened read-only by debugger sessions, which may use a
//! larger pool.
//!
//! Uses [`sqlx`] with runtime query construction (not compile-time checked)
//! so no live database is needed at build time.

use std::path::Path;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::DbError;

/// Default maximum number of connections in the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 1;

/// Default time a statement waits on a locked database.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5000;

/// Default acquire timeout in seconds.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Configuration for the `SQLite` connection pool.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
    /// How long to wait for a free connection.
    pub acquire_timeout: Duration,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }
}

impl SqliteConfig {
    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the busy timeout.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}

/// Connection pool handle to a history database.
#[derive(Debug, Clone)]
pub struct HistoryDb {
    pool: SqlitePool,
}

impl HistoryDb {
    /// Open (creating if missing) the history database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Sqlite`] if the file cannot be opened.
    pub async fn open_file(path: &Path, config: &SqliteConfig) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let db = Self::connect_with(options, config).await?;
        tracing::info!(path = %path.display(), "Opened history database");
        Ok(db)
    }

    /// Connect using a `sqlite:` URL such as `sqlite::memory:`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::Sqlite`] if the connection fails.
    pub async fn connect_url(url: &str, config: &SqliteConfig) -> Result<Self, DbError> {
        let options: SqliteConnectOptions = url
            .parse()
            .map_err(|e: sqlx::Error| DbError::Config(format!("Invalid database URL: {e}")))?;
        Self::connect_with(options.create_if_missing(true), config).await
    }

    /// A private in-memory database with the schema applied.
    ///
    /// The pool holds exactly one connection that is never recycled, since
    /// every `SQLite` memory connection is its own database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or migration fails.
    pub async fn in_memory() -> Result<Self, DbError> {
        let config = SqliteConfig::default().with_max_connections(1);
        let db = Self::connect_url("sqlite::memory:", &config).await?;
        db.run_migrations().await?;
        Ok(db)
    }

    async fn connect_with(
        options: SqliteConnectOptions,
        config: &SqliteConfig,
    ) -> Result<Self, DbError> {
        let options = options
            .foreign_keys(true)
            .busy_timeout(config.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        tracing::debug!(
            max_connections = config.max_connections,
            "Connected to SQLite"
        );

        Ok(Self { pool })
    }

    /// Run all pending migrations from the `migrations/` directory.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Migration`] if any migration fails.
    pub async fn run_migrations(&self) -> Result<(), DbError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::debug!("History schema migrations completed");
        Ok(())
    }

    /// Return a reference to the underlying [`SqlitePool`].
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all connections in the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::debug!("SQLite pool closed");
    }
}

//! Database connection and repositories

pub mod contents;
pub mod genres;
pub mod schema;
pub mod seed;
pub mod sqlite_helpers;
pub mod users;
pub mod viewing_history;
pub mod wishlists;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use contents::{ContentFilter, ContentRecord, ContentSummary, ContentsRepository};
pub use genres::{GenreRecord, GenresRepository};
pub use users::{CreateUser, UpdateUser, UserRecord, UsersRepository};
pub use viewing_history::{
    HistoryEntryRecord, UpsertViewingHistory, ViewingHistoryRepository,
};
pub use wishlists::WishlistsRepository;

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the SQLite database at `url`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL '{}'", url))?
            .create_if_missing(true)
            .foreign_keys(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Ok(Self { pool })
    }

    /// Private in-memory database, used by tests.
    ///
    /// Every connection to `:memory:` is a separate database, so the pool is pinned
    /// to a single connection that never expires.
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Create missing tables and indexes
    pub async fn migrate(&self) -> Result<()> {
        let result = schema::sync_schema(&self.pool).await;
        if !result.errors.is_empty() {
            bail!("Schema sync failed: {}", result.errors.join("; "));
        }
        Ok(())
    }

    /// Round-trip a trivial query, used by readiness checks.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get a users repository
    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    /// Get a contents repository
    pub fn contents(&self) -> ContentsRepository {
        ContentsRepository::new(self.pool.clone())
    }

    /// Get a genres repository
    pub fn genres(&self) -> GenresRepository {
        GenresRepository::new(self.pool.clone())
    }

    /// Get a wishlists repository
    pub fn wishlists(&self) -> WishlistsRepository {
        WishlistsRepository::new(self.pool.clone())
    }

    /// Get a viewing history repository
    pub fn viewing_history(&self) -> ViewingHistoryRepository {
        ViewingHistoryRepository::new(self.pool.clone())
    }
}

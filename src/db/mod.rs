//! Local document store.
//!
//! Four independent collections live in one SQLite database:
//! - `settings`: the singleton profile document
//! - `scripture_units`: one record per chapter
//! - `bookmarks`: verses marked by the user, unique per (chapter, verse)
//! - `action_log`: append-only journal with a synced flag
//!
//! The schema is versioned through `sqlx` migrations, so re-opening an
//! up-to-date database applies nothing.

mod action_log_repo;
mod bookmark_repo;
mod scripture_repo;
mod settings_repo;

pub use action_log_repo::ActionLogRepository;
pub use bookmark_repo::BookmarkRepository;
pub use scripture_repo::ScriptureRepository;
pub use settings_repo::SettingsRepository;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard, OnceCell};

/// How long a statement waits for another connection's write lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by the document store. The store never retries.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Failed to create database directory '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Failed to encode or decode a stored document: {0}")]
    Document(#[from] serde_json::Error),
    #[error("Corrupt record in '{collection}': {reason}")]
    Corrupt {
        collection: &'static str,
        reason: String,
    },
}

/// Initialize the database connection pool and run migrations
pub async fn init_db(path: &Path) -> Result<SqlitePool, StoreError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    tracing::debug!(path = %path.display(), "document store opened");
    Ok(pool)
}

/// Handle to the on-device document store.
///
/// Cheap to clone; all clones share one lazily opened pool. Concurrent
/// callers of [`Store::open`] before the first open completes all await the
/// same initialization, so the schema is created exactly once.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    path: PathBuf,
    pool: OnceCell<SqlitePool>,
    settings_lock: Mutex<()>,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path: path.into(),
                pool: OnceCell::new(),
                settings_lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Returns the ready pool, opening and migrating the database on first
    /// use. A failed open leaves the store unopened; the next call tries
    /// again.
    pub async fn open(&self) -> Result<&SqlitePool, StoreError> {
        self.inner
            .pool
            .get_or_try_init(|| init_db(&self.inner.path))
            .await
    }

    /// Serializes read-merge-write of the settings document across clones.
    pub(crate) async fn settings_lock(&self) -> MutexGuard<'_, ()> {
        self.inner.settings_lock.lock().await
    }

    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.clone())
    }

    pub fn scripture(&self) -> ScriptureRepository {
        ScriptureRepository::new(self.clone())
    }

    pub fn bookmarks(&self) -> BookmarkRepository {
        BookmarkRepository::new(self.clone())
    }

    pub fn action_log(&self) -> ActionLogRepository {
        ActionLogRepository::new(self.clone())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.inner.path)
            .field("opened", &self.inner.pool.initialized())
            .finish()
    }
}

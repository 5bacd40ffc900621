mod delivery_store;
mod preference_store;

pub use delivery_store::*;
pub use preference_store::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

/// SQL migration for the delivery ledger
pub const MIGRATION_001_DELIVERIES: &str = include_str!("migrations/001_deliveries.sql");

/// SQL migration for stored preferences
pub const MIGRATION_002_PREFERENCES: &str = include_str!("migrations/002_preferences.sql");

/// How long a statement waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a connection pool on the SQLite file at `path`.
/// With `create` set, a missing file is created; otherwise opening fails.
pub async fn open_pool(path: impl AsRef<Path>, create: bool) -> Result<SqlitePool> {
    let path = path.as_ref();
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(create)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    tracing::debug!(path = %path.display(), create, "opening database");

    SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database at {}", path.display()))
}

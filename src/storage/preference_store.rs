use std::path::Path;

use anyhow::{Context, anyhow};
use sqlx::{Row, SqlitePool};

use crate::domain::Rate;
use crate::error::Result;

use super::{MIGRATION_002_PREFERENCES, open_pool};

/// Key under which the unit rate is stored.
pub const RATE_KEY: &str = "rate_per_bottle";

/// Durable key/value settings. Holds the unit rate.
#[derive(Clone)]
pub struct PreferenceStore {
    pool: SqlitePool,
}

impl PreferenceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(open_pool(path, false).await?))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_002_PREFERENCES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;
        Ok(())
    }

    pub async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new(open_pool(path, true).await?);
        store.migrate().await?;
        Ok(store)
    }

    /// The stored rate, or the default when none was ever set.
    pub async fn get_rate(&self) -> Result<Rate> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?")
            .bind(RATE_KEY)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to read rate")?;

        match row {
            Some(row) => {
                let value: f64 = row.get("value");
                let rate = Rate::new(value)
                    .map_err(|err| anyhow!("Stored {} is invalid: {}", RATE_KEY, err))?;
                Ok(rate)
            }
            None => Ok(Rate::default()),
        }
    }

    /// Overwrite the stored rate. Non-positive values are rejected before
    /// anything is written.
    pub async fn set_rate(&self, value: f64) -> Result<Rate> {
        let rate = Rate::new(value).inspect_err(|err| {
            tracing::warn!(value, %err, "rejected rate");
        })?;

        sqlx::query(
            r#"
            INSERT INTO preferences (key, value) VALUES (?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(RATE_KEY)
        .bind(rate.value())
        .execute(&self.pool)
        .await
        .context("Failed to save rate")?;

        tracing::info!(rate = rate.value(), "rate updated");
        Ok(rate)
    }
}

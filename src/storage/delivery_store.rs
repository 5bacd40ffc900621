use std::path::Path;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use crate::domain::{Delivery, DeliveryId, DeliveryValidationError, NewDelivery};
use crate::error::{LedgerError, Result};

use super::{MIGRATION_001_DELIVERIES, open_pool};

const SELECT_DELIVERIES: &str = "SELECT id, date, quantity, paid FROM deliveries";

const RETURNING_DELIVERY: &str = "RETURNING id, date, quantity, paid";

/// Most recent first; equal dates fall back to the latest insert first.
const LEDGER_ORDER: &str = "ORDER BY date DESC, id DESC";

/// Durable store of delivery records.
///
/// Every method runs a single SQL statement, so each call is atomic and
/// concurrent readers never observe a half-applied write.
#[derive(Clone)]
pub struct DeliveryStore {
    pool: SqlitePool,
}

impl DeliveryStore {
    /// Create a store over an existing connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open an existing database file.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(open_pool(path, false).await?))
    }

    /// Create the `deliveries` table if needed.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_DELIVERIES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Open (creating if missing) and migrate.
    pub async fn init(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self::new(open_pool(path, true).await?);
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Persist a new delivery and return its freshly assigned id.
    pub async fn insert(&self, delivery: &NewDelivery) -> Result<DeliveryId> {
        Self::check(delivery.validate(), delivery.quantity)?;

        let result = sqlx::query("INSERT INTO deliveries (date, quantity, paid) VALUES (?, ?, ?)")
            .bind(delivery.date.timestamp_millis())
            .bind(delivery.quantity)
            .bind(delivery.paid)
            .execute(&self.pool)
            .await
            .context("Failed to save delivery")?;

        let id = result.last_insert_rowid();
        tracing::info!(id, quantity = delivery.quantity, paid = delivery.paid, "delivery recorded");
        Ok(id)
    }

    /// Get a delivery by id.
    pub async fn get(&self, id: DeliveryId) -> Result<Option<Delivery>> {
        let row = sqlx::query(&format!("{SELECT_DELIVERIES} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch delivery")?;

        row.as_ref().map(Self::row_to_delivery).transpose()
    }

    /// Every live delivery, most recent first.
    pub async fn get_all(&self) -> Result<Vec<Delivery>> {
        let rows = sqlx::query(&format!("{SELECT_DELIVERIES} {LEDGER_ORDER}"))
            .fetch_all(&self.pool)
            .await
            .context("Failed to list deliveries")?;

        tracing::debug!(count = rows.len(), "listed deliveries");
        rows.iter().map(Self::row_to_delivery).collect()
    }

    /// Deliveries with `start <= date <= end`, most recent first.
    /// The caller decides the bounds; no calendar arithmetic happens here.
    pub async fn get_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Delivery>> {
        let rows = sqlx::query(&format!(
            "{SELECT_DELIVERIES} WHERE date >= ? AND date <= ? {LEDGER_ORDER}"
        ))
        .bind(millis_ceil(start))
        .bind(end.timestamp_millis())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list deliveries in range")?;

        tracing::debug!(%start, %end, count = rows.len(), "listed deliveries in range");
        rows.iter().map(Self::row_to_delivery).collect()
    }

    /// Replace the stored record with the same id.
    pub async fn update(&self, delivery: &Delivery) -> Result<()> {
        Self::check(delivery.validate(), delivery.quantity)?;

        let result = sqlx::query("UPDATE deliveries SET date = ?, quantity = ?, paid = ? WHERE id = ?")
            .bind(delivery.date.timestamp_millis())
            .bind(delivery.quantity)
            .bind(delivery.paid)
            .bind(delivery.id)
            .execute(&self.pool)
            .await
            .context("Failed to update delivery")?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(delivery.id));
        }
        tracing::info!(id = delivery.id, paid = delivery.paid, "delivery updated");
        Ok(())
    }

    /// Set `paid` in a single statement and return the stored record.
    pub async fn set_paid(&self, id: DeliveryId, paid: bool) -> Result<Delivery> {
        let row = sqlx::query(&format!(
            "UPDATE deliveries SET paid = ? WHERE id = ? {RETURNING_DELIVERY}"
        ))
        .bind(paid)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update delivery")?
        .ok_or(LedgerError::NotFound(id))?;

        tracing::info!(id, paid, "delivery payment status set");
        Self::row_to_delivery(&row)
    }

    /// Flip `paid` in a single statement, so concurrent toggles never
    /// overwrite each other, and return the stored record.
    pub async fn toggle_paid(&self, id: DeliveryId) -> Result<Delivery> {
        let row = sqlx::query(&format!(
            "UPDATE deliveries SET paid = 1 - paid WHERE id = ? {RETURNING_DELIVERY}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to toggle delivery")?
        .ok_or(LedgerError::NotFound(id))?;

        let delivery = Self::row_to_delivery(&row)?;
        tracing::info!(id, paid = delivery.paid, "delivery payment status toggled");
        Ok(delivery)
    }

    /// Permanently remove a delivery.
    pub async fn delete(&self, id: DeliveryId) -> Result<()> {
        let result = sqlx::query("DELETE FROM deliveries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete delivery")?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(id));
        }
        tracing::info!(id, "delivery deleted");
        Ok(())
    }

    /// Number of live deliveries.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query("SELECT COUNT(*) as count FROM deliveries")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count deliveries")?
            .get("count");
        Ok(count)
    }

    fn check(
        validation: std::result::Result<(), DeliveryValidationError>,
        quantity: i64,
    ) -> Result<()> {
        validation.map_err(|err| {
            tracing::warn!(quantity, %err, "rejected delivery");
            LedgerError::from(err)
        })
    }

    fn row_to_delivery(row: &sqlx::sqlite::SqliteRow) -> Result<Delivery> {
        let id: DeliveryId = row.get("id");
        let date_millis: i64 = row.get("date");

        Ok(Delivery {
            id,
            date: DateTime::from_timestamp_millis(date_millis)
                .ok_or_else(|| anyhow!("Invalid date {} on delivery {}", date_millis, id))?,
            quantity: row.get("quantity"),
            paid: row.get::<i32, _>("paid") != 0,
        })
    }
}

/// Smallest whole millisecond not earlier than `instant`. Stored dates are
/// whole milliseconds, so this keeps `start <= date` exact for range bounds
/// with sub-millisecond precision.
fn millis_ceil(instant: DateTime<Utc>) -> i64 {
    let millis = instant.timestamp_millis();
    if instant.timestamp_subsec_nanos() % 1_000_000 == 0 {
        millis
    } else {
        millis + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(timestamp: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(timestamp)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_millis_ceil() {
        assert_eq!(millis_ceil(at("1970-01-01T00:00:00.002Z")), 2);
        assert_eq!(millis_ceil(at("1970-01-01T00:00:00.002000001Z")), 3);
        assert_eq!(millis_ceil(at("1970-01-01T00:00:00.000700Z")), 1);
        assert_eq!(millis_ceil(at("1969-12-31T23:59:59.999500Z")), 0);
    }
}

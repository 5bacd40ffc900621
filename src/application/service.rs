use std::path::Path;

use chrono::{DateTime, Utc};

use crate::domain::{
    DateRange, Delivery, DeliveryId, DeliveryTotals, NewDelivery, Rate, YearMonth, compute_totals,
};
use crate::error::{LedgerError, Result};
use crate::storage::{DeliveryStore, PreferenceStore, open_pool};

use super::{MonthlySummary, Summary, YearReport};

/// Application service providing high-level operations for the ledger.
/// This is the primary interface for any client (CLI, TUI, etc.).
///
/// Holds no state of its own beyond the two store handles, so it can be
/// rebuilt from them at any time.
#[derive(Clone)]
pub struct LedgerService {
    deliveries: DeliveryStore,
    preferences: PreferenceStore,
}

impl LedgerService {
    /// Create a new ledger service over the given stores.
    pub fn new(deliveries: DeliveryStore, preferences: PreferenceStore) -> Self {
        Self {
            deliveries,
            preferences,
        }
    }

    /// Create (if needed) and migrate the database at the given path.
    pub async fn init(database_path: impl AsRef<Path>) -> Result<Self> {
        let pool = open_pool(database_path, true).await?;
        let deliveries = DeliveryStore::new(pool.clone());
        let preferences = PreferenceStore::new(pool);
        deliveries.migrate().await?;
        preferences.migrate().await?;
        Ok(Self::new(deliveries, preferences))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: impl AsRef<Path>) -> Result<Self> {
        let pool = open_pool(database_path, false).await?;
        Ok(Self::new(
            DeliveryStore::new(pool.clone()),
            PreferenceStore::new(pool),
        ))
    }

    pub fn deliveries(&self) -> &DeliveryStore {
        &self.deliveries
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.preferences
    }

    // ========================
    // Delivery operations
    // ========================

    /// Record a new delivery.
    pub async fn record_delivery(
        &self,
        date: DateTime<Utc>,
        quantity: i64,
        paid: bool,
    ) -> Result<Delivery> {
        let new = NewDelivery::new(date, quantity).with_paid(paid);
        let id = self.deliveries.insert(&new).await?;
        Ok(Delivery::from_new(id, new))
    }

    /// Get a delivery by id.
    pub async fn get_delivery(&self, id: DeliveryId) -> Result<Delivery> {
        self.deliveries
            .get(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }

    /// All deliveries, most recent first.
    pub async fn list_deliveries(&self) -> Result<Vec<Delivery>> {
        self.deliveries.get_all().await
    }

    /// Deliveries dated within `start..=end`, most recent first.
    pub async fn list_deliveries_in(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Delivery>> {
        self.deliveries.get_range(start, end).await
    }

    /// Deliveries dated within a calendar month.
    pub async fn deliveries_for_month(&self, month: YearMonth) -> Result<Vec<Delivery>> {
        let range = month.range();
        self.deliveries.get_range(range.start, range.end).await
    }

    /// Set the payment status of a delivery, keeping its date and quantity.
    pub async fn set_paid(&self, id: DeliveryId, paid: bool) -> Result<Delivery> {
        self.deliveries.set_paid(id, paid).await
    }

    /// Flip the payment status of a delivery.
    pub async fn toggle_paid(&self, id: DeliveryId) -> Result<Delivery> {
        self.deliveries.toggle_paid(id).await
    }

    /// Permanently delete a delivery.
    pub async fn delete_delivery(&self, id: DeliveryId) -> Result<()> {
        self.deliveries.delete(id).await
    }

    // ========================
    // Aggregation
    // ========================

    /// Summarize deliveries dated within `period_start..=period_end` at the
    /// current rate.
    pub async fn summarize(
        &self,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
    ) -> Result<Summary> {
        let deliveries = self.deliveries.get_range(period_start, period_end).await?;
        let totals = compute_totals(&deliveries)?;
        let rate = self.preferences.get_rate().await?;

        tracing::debug!(
            %period_start,
            %period_end,
            deliveries = totals.delivery_count,
            "summarized period"
        );
        Ok(Summary::new(
            DateRange::new(period_start, period_end),
            totals,
            rate,
        ))
    }

    /// Summarize a calendar month.
    pub async fn summarize_month(&self, month: YearMonth) -> Result<Summary> {
        let range = month.range();
        self.summarize(range.start, range.end).await
    }

    /// Per-month summaries for a year plus the year's total. Reads the year
    /// once so every month is computed from the same snapshot and rate.
    pub async fn yearly_breakdown(&self, year: i32) -> Result<YearReport> {
        let months = YearMonth::months_of(year)
            .ok_or_else(|| LedgerError::invalid(format!("year {} is out of range", year)))?;
        let year_range = DateRange::year(year)
            .ok_or_else(|| LedgerError::invalid(format!("year {} is out of range", year)))?;

        let deliveries = self
            .deliveries
            .get_range(year_range.start, year_range.end)
            .await?;
        let rate = self.preferences.get_rate().await?;

        let mut total = DeliveryTotals::default();
        let mut monthly = Vec::with_capacity(months.len());
        for month in months {
            let range = month.range();
            let totals = compute_totals(deliveries.iter().filter(|d| range.contains(d.date)))?;
            total.merge(&totals)?;
            monthly.push(MonthlySummary::new(month, Summary::new(range, totals, rate)));
        }

        Ok(YearReport {
            year,
            months: monthly,
            total: Summary::new(year_range, total, rate),
        })
    }

    /// Move `delta` months from `month`, rolling over year boundaries.
    pub fn shift_month(month: YearMonth, delta: i32) -> Result<YearMonth> {
        month.shift(delta).ok_or_else(|| {
            LedgerError::invalid(format!("{} shifted by {} months is out of range", month, delta))
        })
    }

    // ========================
    // Rate
    // ========================

    /// The unit rate applied to summaries.
    pub async fn current_rate(&self) -> Result<Rate> {
        self.preferences.get_rate().await
    }

    /// Change the unit rate. Affects summaries computed from now on.
    pub async fn set_rate(&self, value: f64) -> Result<Rate> {
        self.preferences.set_rate(value).await
    }
}

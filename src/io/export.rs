use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{DateRange, Delivery};

/// Full ledger snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub rate: f64,
    pub deliveries: Vec<Delivery>,
}

/// Exporter for writing ledger data out of the database
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export deliveries to CSV, in ledger order. `range` limits the rows to
    /// one period; `None` exports everything.
    pub async fn export_deliveries_csv<W: Write>(
        &self,
        writer: W,
        range: Option<DateRange>,
    ) -> Result<usize> {
        let deliveries = match range {
            Some(range) => {
                self.service
                    .list_deliveries_in(range.start, range.end)
                    .await?
            }
            None => self.service.list_deliveries().await?,
        };
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "date", "quantity", "paid"])?;

        for delivery in &deliveries {
            csv_writer.write_record([
                delivery.id.to_string(),
                delivery.date.to_rfc3339(),
                delivery.quantity.to_string(),
                delivery.paid.to_string(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(deliveries.len())
    }

    /// Export every delivery plus the current rate as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let deliveries = self.service.list_deliveries().await?;
        let rate = self.service.current_rate().await?;

        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            rate: rate.value(),
            deliveries,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}

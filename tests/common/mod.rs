// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bottlebook::application::LedgerService;
use bottlebook::domain::Delivery;
use chrono::{DateTime, NaiveDate, Utc};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let service = LedgerService::init(temp_dir.path().join("test.db")).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into DateTime<Utc> at midnight
pub fn parse_date(date_str: &str) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
}

/// Helper to parse an RFC 3339 timestamp into DateTime<Utc>
pub fn parse_datetime(timestamp: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(timestamp)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn ids(deliveries: &[Delivery]) -> Vec<i64> {
    deliveries.iter().map(|d| d.id).collect()
}

/// Test fixture: two March deliveries and one in April
pub struct SpringDeliveries {
    pub march_unpaid: Delivery,
    pub march_paid: Delivery,
    pub april_unpaid: Delivery,
}

impl SpringDeliveries {
    pub async fn record(service: &LedgerService) -> Result<Self> {
        let march_unpaid = service
            .record_delivery(parse_date("2024-03-05"), 2, false)
            .await?;
        let march_paid = service
            .record_delivery(parse_date("2024-03-20"), 1, true)
            .await?;
        let april_unpaid = service
            .record_delivery(parse_date("2024-04-01"), 5, false)
            .await?;
        Ok(Self {
            march_unpaid,
            march_paid,
            april_unpaid,
        })
    }
}

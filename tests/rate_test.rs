mod common;

use anyhow::Result;
use bottlebook::LedgerError;
use bottlebook::application::LedgerService;
use bottlebook::domain::{DEFAULT_RATE, YearMonth};
use bottlebook::storage::PreferenceStore;
use common::test_service;
use tempfile::TempDir;

#[tokio::test]
async fn test_default_rate_before_any_write() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert_eq!(service.current_rate().await?.value(), DEFAULT_RATE);
    assert_eq!(service.current_rate().await?.value(), 20.0);

    Ok(())
}

#[tokio::test]
async fn test_rate_persists_across_reopen() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("prefs.db");

    let store = PreferenceStore::init(&path).await?;
    store.set_rate(25.5).await?;
    drop(store);

    let fresh = PreferenceStore::connect(&path).await?;
    assert_eq!(fresh.get_rate().await?.value(), 25.5);

    Ok(())
}

#[tokio::test]
async fn test_last_write_wins() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.set_rate(22.0).await?;
    service.set_rate(18.75).await?;

    assert_eq!(service.current_rate().await?.value(), 18.75);
    Ok(())
}

#[tokio::test]
async fn test_invalid_rate_rejected_and_previous_kept() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.set_rate(30.0).await?;

    for value in [0.0, -5.0, f64::NAN, f64::INFINITY] {
        let result = service.set_rate(value).await;
        assert!(matches!(result, Err(LedgerError::InvalidInput(_))));
    }

    assert_eq!(service.current_rate().await?.value(), 30.0);
    Ok(())
}

#[tokio::test]
async fn test_service_reopen_sees_rate_and_deliveries() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("ledger.db");

    {
        let service = LedgerService::init(&path).await?;
        service.set_rate(12.5).await?;
        service
            .record_delivery(common::parse_date("2024-03-05"), 4, false)
            .await?;
    }

    let service = LedgerService::connect(&path).await?;
    let month: YearMonth = "2024-03".parse()?;
    let summary = service.summarize_month(month).await?;

    assert_eq!(summary.rate, 12.5);
    assert_eq!(summary.total_cost, 50.0);
    Ok(())
}

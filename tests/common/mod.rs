// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use receita::application::DashboardService;
use receita::domain::{CategoryFilter, ComparisonRequest, PeriodSelector, Settings};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(DashboardService, TempDir)> {
    test_service_with(Settings::default()).await
}

/// Same as `test_service`, with explicit engine settings
pub async fn test_service_with(settings: Settings) -> Result<(DashboardService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = DashboardService::init(db_path.to_str().unwrap(), settings).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a YYYY-MM-DD date string
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Helper to build a period from a YYYY-MM string
pub fn period(s: &str) -> PeriodSelector {
    s.parse().unwrap()
}

pub fn request(current: &str, previous: &str, category: Option<&str>) -> ComparisonRequest {
    ComparisonRequest {
        current: period(current),
        previous: period(previous),
        category: CategoryFilter::from_input(category),
    }
}

/// Test fixture: February and March receipts across two categories.
///
/// February: Consultas/Clinico 100.00
/// March:    Consultas/Clinico 150.00, Exames/Hemograma 20.00
pub async fn seed_two_months(service: &DashboardService) -> Result<()> {
    service
        .record_receipt(parse_date("2024-02-10"), "Consultas", "Clinico", 10000)
        .await?;
    service
        .record_receipt(parse_date("2024-03-05"), "Consultas", "Clinico", 15000)
        .await?;
    service
        .record_receipt(parse_date("2024-03-20"), "Exames", "Hemograma", 2000)
        .await?;
    Ok(())
}

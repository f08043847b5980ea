mod common;

use anyhow::Result;
use common::{parse_date, period, request, seed_two_months, test_service, test_service_with};
use tempfile::TempDir;
use receita::application::{AppError, DashboardService};
use receita::domain::{CategoryFilter, OnInvalidPeriod, Settings, ZeroBaselinePolicy};
use receita::storage::{NewReceipt, Repository};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_compare_totals_and_breakdowns() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;

    let report = service.compare(&request("2024-03", "2024-02", None)).await?;
    let c = &report.comparison;

    assert_eq!(c.current_total(), 17000);
    assert_eq!(c.previous_total(), 10000);
    assert_eq!(c.total.percent_change, Some(dec!(70)));
    assert!(!c.total.regressed);
    assert_eq!(c.corrected_previous, None);

    assert_eq!(c.by_category.len(), 2);
    assert_eq!(c.by_category[0].key, "Consultas");
    assert_eq!(c.by_category[0].percent_change, Some(dec!(50)));
    assert_eq!(c.by_category[1].key, "Exames");
    assert_eq!(c.by_category[1].previous_total, 0);
    assert_eq!(c.by_category[1].percent_change, None);

    let keys: Vec<&str> = c.by_item.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, vec!["Clinico", "Hemograma"]);

    Ok(())
}

#[tokio::test]
async fn test_compare_report_zero_policy() -> Result<()> {
    let settings = Settings {
        zero_baseline: ZeroBaselinePolicy::ReportZero,
        ..Settings::default()
    };
    let (service, _temp) = test_service_with(settings).await?;
    seed_two_months(&service).await?;

    let report = service.compare(&request("2024-03", "2024-02", None)).await?;
    let exames = &report.comparison.by_category[1];
    assert_eq!(exames.key, "Exames");
    assert_eq!(exames.percent_change, Some(dec!(0)));
    assert_eq!(report.settings.zero_baseline, ZeroBaselinePolicy::ReportZero);

    Ok(())
}

#[tokio::test]
async fn test_compare_regression_is_flagged() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;

    // March back to February: totals flip direction
    let report = service.compare(&request("2024-04", "2024-03", None)).await?;
    let c = &report.comparison;
    assert_eq!(c.current_total(), 0);
    assert_eq!(c.previous_total(), 17000);
    assert_eq!(c.total.percent_change, Some(dec!(-100)));
    assert!(c.total.regressed);
    assert!(c.by_category.iter().all(|r| r.regressed));

    Ok(())
}

#[tokio::test]
async fn test_compare_halts_on_out_of_order_periods() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;

    let err = service
        .compare(&request("2024-02", "2024-03", None))
        .await
        .unwrap_err();
    match err {
        AppError::InvalidPeriodOrder { current, previous } => {
            assert_eq!(current, period("2024-02"));
            assert_eq!(previous, period("2024-03"));
        }
        other => panic!("expected InvalidPeriodOrder, got {:?}", other),
    }

    // Same period on both sides is out of order too
    let result = service.compare(&request("2024-03", "2024-03", None)).await;
    assert!(matches!(result, Err(AppError::InvalidPeriodOrder { .. })));

    Ok(())
}

#[tokio::test]
async fn test_compare_auto_corrects_previous_period() -> Result<()> {
    let settings = Settings {
        on_invalid_period: OnInvalidPeriod::AutoCorrectToPriorMonth,
        ..Settings::default()
    };
    let (service, _temp) = test_service_with(settings).await?;
    seed_two_months(&service).await?;

    let report = service.compare(&request("2024-03", "2024-05", None)).await?;
    let c = &report.comparison;
    assert_eq!(c.previous, period("2024-02"));
    assert_eq!(c.corrected_previous, Some(period("2024-05")));
    assert_eq!(c.previous_total(), 10000);
    assert_eq!(c.total.percent_change, Some(dec!(70)));

    Ok(())
}

#[tokio::test]
async fn test_category_spellings_are_merged() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service
        .record_receipt(parse_date("2024-02-01"), "saúde mental", "Terapia", 5000)
        .await?;
    service
        .record_receipt(parse_date("2024-03-01"), "SAÚDE  MENTAL", "Terapia", 6000)
        .await?;
    service
        .record_receipt(parse_date("2024-03-02"), "Saúde Mental", "Grupo", 4000)
        .await?;
    service
        .record_receipt(parse_date("2024-03-03"), "Nutrição", "Consulta", 9900)
        .await?;

    let categories = service.list_categories().await?;
    let names: Vec<&str> = categories.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(names, vec!["Nutrição", "Saúde Mental"]);
    assert_eq!(categories[1].spellings.len(), 3);

    let report = service
        .compare(&request("2024-03", "2024-02", Some("saúde mental")))
        .await?;
    let c = &report.comparison;
    assert_eq!(
        c.category_filter,
        CategoryFilter::Only("Saúde Mental".to_string())
    );
    assert_eq!(c.current_total(), 10000);
    assert_eq!(c.previous_total(), 5000);
    assert_eq!(c.total.percent_change, Some(dec!(100)));
    assert_eq!(c.by_category.len(), 1);
    assert_eq!(c.by_category[0].key, "Saúde Mental");

    Ok(())
}

#[tokio::test]
async fn test_unknown_category_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;

    let result = service
        .compare(&request("2024-03", "2024-02", Some("Cirurgia")))
        .await;
    assert!(matches!(result, Err(AppError::UnknownCategory(ref c)) if c == "Cirurgia"));

    // "todos" selects every category
    let report = service
        .compare(&request("2024-03", "2024-02", Some("todos")))
        .await?;
    assert_eq!(report.comparison.category_filter, CategoryFilter::All);

    Ok(())
}

#[tokio::test]
async fn test_unreadable_records_are_reported_not_summed() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;

    let stored = service
        .store_receipts(&[
            NewReceipt {
                received_on: Some("2024-03-15".to_string()),
                category: "Consultas".to_string(),
                item: "Clinico".to_string(),
                amount: Some("cento e vinte".to_string()),
            },
            NewReceipt {
                received_on: Some("ontem".to_string()),
                category: "Consultas".to_string(),
                item: "Clinico".to_string(),
                amount: Some("80.00".to_string()),
            },
            NewReceipt {
                received_on: Some("2024-03-16".to_string()),
                category: "Consultas".to_string(),
                item: "Retorno".to_string(),
                amount: None,
            },
        ])
        .await?;
    assert_eq!(stored, 3);

    let report = service.compare(&request("2024-03", "2024-02", None)).await?;
    assert_eq!(report.comparison.current_total(), 17000);
    assert_eq!(report.data_quality.records, 6);
    assert_eq!(report.data_quality.unreadable_dates, 1);
    assert_eq!(report.data_quality.unreadable_amounts, 1);
    assert_eq!(report.data_quality.absent_amounts, 1);
    assert!(!report.data_quality.is_clean());

    // The record with no amount still shows up as a zero-valued item
    let retorno = report
        .comparison
        .by_item
        .iter()
        .find(|r| r.key == "Retorno")
        .expect("Retorno item");
    assert_eq!(retorno.current_total, 0);

    Ok(())
}

#[tokio::test]
async fn test_compare_is_repeatable() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;

    let req = request("2024-03", "2024-02", None);
    let first = service.compare(&req).await?;
    let second = service.compare(&req).await?;
    assert_eq!(first.comparison, second.comparison);
    assert_eq!(first.data_loaded_at, second.data_loaded_at);

    Ok(())
}

#[tokio::test]
async fn test_new_receipts_invalidate_cached_records() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;

    let req = request("2024-03", "2024-02", None);
    let before = service.compare(&req).await?;
    assert_eq!(before.comparison.current_total(), 17000);

    service
        .record_receipt(parse_date("2024-03-31"), "Exames", "Raio X", 3000)
        .await?;
    let after = service.compare(&req).await?;
    assert_eq!(after.comparison.current_total(), 20000);
    assert_eq!(after.comparison.total.percent_change, Some(dec!(100)));

    assert_eq!(service.refresh().await?, 4);
    assert_eq!(service.count_receipts().await?, 4);

    Ok(())
}

#[tokio::test]
async fn test_record_receipt_input_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .record_receipt_input("15/03/2024", "Exames", "Hemograma", "1.234,56")
        .await?;
    let snapshot = service.snapshot().await?;
    assert_eq!(snapshot.records.len(), 1);
    assert_eq!(snapshot.records[0].date, Some(parse_date("2024-03-15")));
    assert_eq!(snapshot.records[0].amount.summable(), Some(123456));

    let bad_date = service
        .record_receipt_input("2024-13-01", "Exames", "Hemograma", "10")
        .await;
    assert!(matches!(bad_date, Err(AppError::InvalidDate(_))));

    let bad_amount = service
        .record_receipt_input("2024-03-01", "Exames", "Hemograma", "dez")
        .await;
    assert!(matches!(bad_amount, Err(AppError::InvalidAmount(_))));

    let empty_category = service
        .record_receipt(parse_date("2024-03-01"), "   ", "Hemograma", 1000)
        .await;
    assert!(matches!(empty_category, Err(AppError::InvalidCategory(_))));

    Ok(())
}

#[tokio::test]
async fn test_period_options() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;
    service
        .record_receipt(parse_date("2023-12-01"), "Consultas", "Clinico", 500)
        .await?;

    let options = service.period_options(parse_date("2024-01-10")).await?;
    assert_eq!(options.years, vec![2023, 2024]);
    assert_eq!(options.default_current, period("2023-12"));
    assert_eq!(options.default_previous, period("2023-11"));

    Ok(())
}

#[tokio::test]
async fn test_period_order_is_checked_before_category() -> Result<()> {
    let (service, _temp) = test_service().await?;
    seed_two_months(&service).await?;

    let result = service
        .compare(&request("2024-02", "2024-03", Some("Cirurgia")))
        .await;
    assert!(matches!(result, Err(AppError::InvalidPeriodOrder { .. })));

    Ok(())
}

#[tokio::test]
async fn test_refresh_picks_up_external_writes() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let db_file = temp_dir.path().join("test.db");
    let db_path = db_file.to_str().unwrap();
    let service = DashboardService::init(db_path, Settings::default()).await?;
    seed_two_months(&service).await?;

    let req = request("2024-03", "2024-02", None);
    assert_eq!(service.compare(&req).await?.comparison.current_total(), 17000);

    // Another writer adds a receipt behind the service's back
    let other = Repository::connect(&format!("sqlite:{}", db_path)).await?;
    other
        .save_receipt(&NewReceipt::new(
            parse_date("2024-03-25"),
            "Exames",
            "Raio X",
            3000,
        ))
        .await?;

    // Still the cached snapshot
    assert_eq!(service.compare(&req).await?.comparison.current_total(), 17000);

    assert_eq!(service.refresh().await?, 4);
    let report = service.compare(&req).await?;
    assert_eq!(report.comparison.current_total(), 20000);
    assert_eq!(report.comparison.total.percent_change, Some(dec!(100)));

    Ok(())
}

#[tokio::test]
async fn test_large_totals_do_not_overflow() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let huge = NewReceipt {
        received_on: Some("2024-03-01".to_string()),
        category: "Contratos".to_string(),
        item: "Anual".to_string(),
        amount: Some("90000000000000000".to_string()),
    };
    service.store_receipts(&[huge.clone(), huge]).await?;

    let report = service.compare(&request("2024-03", "2024-02", None)).await?;
    assert_eq!(
        report.comparison.current_total(),
        2 * 9_000_000_000_000_000_000
    );
    assert!(report.data_quality.is_clean());

    Ok(())
}

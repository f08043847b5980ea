use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};

use crate::domain::{
    default_periods, parse_cents, parse_record_date, run_comparison, scan_records, summarize,
    CategoryFilter, Cents, ComparisonRequest, Settings,
};
use crate::storage::{NewReceipt, ReceiptId, Repository, Snapshot, TransactionCache};

use super::{AppError, CategoryOption, ComparisonReport, PeriodOptions};

/// Upper bound on individual data-quality warnings written to the log per
/// comparison; the rest only show up in the counts.
const MAX_LOGGED_WARNINGS: usize = 20;

/// Application service providing the dashboard operations.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct DashboardService {
    repo: Repository,
    cache: TransactionCache,
    settings: Settings,
}

impl DashboardService {
    /// Create a new service with the given repository and engine settings.
    pub fn new(repo: Repository, settings: Settings) -> Self {
        Self {
            repo,
            cache: TransactionCache::new(),
            settings,
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str, settings: Settings) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo, settings))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str, settings: Settings) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo, settings))
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    // ========================
    // Receipt operations
    // ========================

    /// Record a single receipt.
    pub async fn record_receipt(
        &self,
        received_on: NaiveDate,
        category: &str,
        item: &str,
        amount_cents: Cents,
    ) -> Result<ReceiptId, AppError> {
        if category.trim().is_empty() {
            return Err(AppError::InvalidCategory(
                "category must not be empty".to_string(),
            ));
        }

        let receipt = NewReceipt::new(received_on, category.trim(), item.trim(), amount_cents);
        let id = self.repo.save_receipt(&receipt).await?;
        self.cache.invalidate().await;

        tracing::debug!(%id, %received_on, category, item, amount_cents, "recorded receipt");
        Ok(id)
    }

    /// Record a receipt from operator text input.
    pub async fn record_receipt_input(
        &self,
        received_on: &str,
        category: &str,
        item: &str,
        amount: &str,
    ) -> Result<ReceiptId, AppError> {
        let date = parse_record_date(received_on)
            .ok_or_else(|| AppError::InvalidDate(received_on.to_string()))?;
        let amount_cents = parse_cents(amount)
            .map_err(|e| AppError::InvalidAmount(format!("'{}': {}", amount, e)))?;
        self.record_receipt(date, category, item, amount_cents).await
    }

    /// Store a batch of receipts as they came from an external source.
    pub async fn store_receipts(&self, receipts: &[NewReceipt]) -> Result<usize, AppError> {
        let stored = self.repo.save_receipts(receipts).await?;
        self.cache.invalidate().await;
        Ok(stored)
    }

    pub async fn count_receipts(&self) -> Result<i64, AppError> {
        Ok(self.repo.count_receipts().await?)
    }

    /// Current records, from the cache when it holds a snapshot.
    pub async fn snapshot(&self) -> Result<Snapshot, AppError> {
        Ok(self.cache.get_or_load(&self.repo).await?)
    }

    /// Reload the records from the store. Returns the number loaded.
    pub async fn refresh(&self) -> Result<usize, AppError> {
        let snapshot = self.cache.refresh(&self.repo).await?;
        tracing::info!(records = snapshot.records.len(), "reloaded receipts");
        Ok(snapshot.records.len())
    }

    // ========================
    // Reporting
    // ========================

    /// Compare the requested periods over the current records.
    pub async fn compare(&self, request: &ComparisonRequest) -> Result<ComparisonReport, AppError> {
        let snapshot = self.snapshot().await?;

        let data_quality = summarize(&snapshot.records);
        if !data_quality.is_clean() {
            let warnings = scan_records(&snapshot.records);
            for warning in warnings.iter().take(MAX_LOGGED_WARNINGS) {
                tracing::warn!("{}", warning);
            }
            tracing::warn!(
                unreadable_dates = data_quality.unreadable_dates,
                unreadable_amounts = data_quality.unreadable_amounts,
                "some records were left out of the comparison"
            );
        }

        // Period order is checked inside, before the category is looked up.
        let comparison = run_comparison(&snapshot.records, request, self.settings)?;

        if let CategoryFilter::Only(category) = &request.category {
            let known = self.list_categories().await?;
            if !known.iter().any(|c| &c.category == category) {
                return Err(AppError::UnknownCategory(category.clone()));
            }
        }

        if let Some(requested) = comparison.corrected_previous {
            tracing::warn!(
                %requested,
                corrected = %comparison.previous,
                "previous period was not before {}, using the prior month instead",
                comparison.current
            );
        }

        tracing::debug!(
            current = %comparison.current,
            previous = %comparison.previous,
            filter = %comparison.category_filter,
            current_total = %comparison.current_total(),
            previous_total = %comparison.previous_total(),
            "comparison computed"
        );

        Ok(ComparisonReport {
            comparison,
            settings: self.settings,
            data_quality,
            data_loaded_at: snapshot.loaded_at,
        })
    }

    /// Canonical categories with the raw spellings that map to each, sorted.
    pub async fn list_categories(&self) -> Result<Vec<CategoryOption>, AppError> {
        let snapshot = self.snapshot().await?;

        let mut groups: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for record in snapshot.records.iter() {
            let canonical = record.canonical_category();
            if canonical.is_empty() {
                continue;
            }
            groups
                .entry(canonical)
                .or_default()
                .insert(record.category.clone());
        }

        Ok(groups
            .into_iter()
            .map(|(category, spellings)| CategoryOption {
                category,
                spellings: spellings.into_iter().collect(),
            })
            .collect())
    }

    /// Years with dated records and the default period selection for `today`.
    pub async fn period_options(&self, today: NaiveDate) -> Result<PeriodOptions, AppError> {
        let snapshot = self.snapshot().await?;

        let years: BTreeSet<i32> = snapshot
            .records
            .iter()
            .filter_map(|r| r.date.map(|d| d.year()))
            .collect();
        let defaults = default_periods(today);

        Ok(PeriodOptions {
            years: years.into_iter().collect(),
            default_current: defaults.current,
            default_previous: defaults.previous,
        })
    }
}

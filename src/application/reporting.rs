use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    format_cents, format_percent, Comparison, DataQualitySummary, MoneyFormat, PeriodSelector,
    Settings,
};

/// Everything a presentation layer needs for one comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub comparison: Comparison,
    pub settings: Settings,
    pub data_quality: DataQualitySummary,
    /// When the records behind this report were read from the store.
    pub data_loaded_at: DateTime<Utc>,
}

/// The three figures of the summary document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub current_period: PeriodSelector,
    pub previous_period: PeriodSelector,
    pub current_total: String,
    pub previous_total: String,
    pub percent_change: String,
}

/// A category as offered for selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOption {
    /// Canonical label.
    pub category: String,
    /// Distinct raw spellings that map to it.
    pub spellings: Vec<String>,
}

/// Years that have at least one dated record, with the suggested defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodOptions {
    pub years: Vec<i32>,
    pub default_current: PeriodSelector,
    pub default_previous: PeriodSelector,
}

impl ComparisonReport {
    /// Flatten the headline figures for a summary document.
    pub fn summary(&self, format: &MoneyFormat) -> SummaryLine {
        let c = &self.comparison;
        SummaryLine {
            current_period: c.current,
            previous_period: c.previous,
            current_total: format_cents(c.current_total(), format),
            previous_total: format_cents(c.previous_total(), format),
            percent_change: format_percent(c.total.percent_change),
        }
    }
}

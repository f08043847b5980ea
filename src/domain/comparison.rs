use serde::{Deserialize, Serialize};

use super::{
    aggregate, aggregate_scalar, compare_groups, filter_records, resolve_periods, CategoryFilter,
    GroupBy, OnInvalidPeriod, PeriodError, PeriodSelector, TotalCents, TransactionRecord,
    VariationResult, ZeroBaselinePolicy,
};

/// Engine settings chosen by the entry point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub on_invalid_period: OnInvalidPeriod,
    pub zero_baseline: ZeroBaselinePolicy,
}

/// What the operator asked to compare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub current: PeriodSelector,
    pub previous: PeriodSelector,
    pub category: CategoryFilter,
}

/// Result of a period comparison over one record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub current: PeriodSelector,
    pub previous: PeriodSelector,
    /// The previous period the operator asked for, when it was replaced.
    pub corrected_previous: Option<PeriodSelector>,
    pub category_filter: CategoryFilter,
    pub total: VariationResult,
    pub by_category: Vec<VariationResult>,
    pub by_item: Vec<VariationResult>,
}

impl Comparison {
    pub fn current_total(&self) -> TotalCents {
        self.total.current_total
    }

    pub fn previous_total(&self) -> TotalCents {
        self.total.previous_total
    }
}

/// Validate the periods, then filter, aggregate and compare both months.
///
/// Nothing runs when the periods are out of order and the policy is
/// `Halt`. The same inputs always produce the same `Comparison`.
pub fn run_comparison(
    records: &[TransactionRecord],
    request: &ComparisonRequest,
    settings: Settings,
) -> Result<Comparison, PeriodError> {
    let periods = resolve_periods(request.current, request.previous, settings.on_invalid_period)?;

    let current = filter_records(records, periods.current, &request.category);
    let previous = filter_records(records, periods.previous, &request.category);

    let total = VariationResult::new(
        "total",
        aggregate_scalar(previous.iter().copied()),
        aggregate_scalar(current.iter().copied()),
        settings.zero_baseline,
    );

    let by_category = compare_groups(
        &aggregate(previous.iter().copied(), GroupBy::Category),
        &aggregate(current.iter().copied(), GroupBy::Category),
        settings.zero_baseline,
    );

    let by_item = compare_groups(
        &aggregate(previous.iter().copied(), GroupBy::Item),
        &aggregate(current.iter().copied(), GroupBy::Item),
        settings.zero_baseline,
    );

    Ok(Comparison {
        current: periods.current,
        previous: periods.previous,
        corrected_previous: periods.corrected_from,
        category_filter: request.category.clone(),
        total,
        by_category,
        by_item,
    })
}

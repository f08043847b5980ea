use super::{CategoryFilter, PeriodSelector, TransactionRecord};

/// Select the records dated inside `period` that pass `category`.
/// Records without a readable date are never selected.
pub fn filter_records<'a>(
    records: &'a [TransactionRecord],
    period: PeriodSelector,
    category: &CategoryFilter,
) -> Vec<&'a TransactionRecord> {
    records
        .iter()
        .filter(|r| r.date.is_some_and(|date| period.contains(date)))
        .filter(|r| category.matches(&r.category))
        .collect()
}

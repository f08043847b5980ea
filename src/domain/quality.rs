use serde::{Deserialize, Serialize};

use super::{Amount, TransactionRecord};

/// A record that computations had to leave (partly) out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DataQualityWarning {
    UnreadableDate { index: usize, category: String, item: String },
    UnreadableAmount { index: usize, value: String },
}

impl std::fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataQualityWarning::UnreadableDate {
                index,
                category,
                item,
            } => write!(
                f,
                "record #{} ({} / {}) has no readable date and was excluded",
                index, category, item
            ),
            DataQualityWarning::UnreadableAmount { index, value } => write!(
                f,
                "record #{} has a non-numeric amount '{}' and was left out of totals",
                index, value
            ),
        }
    }
}

/// Counts of data-quality issues in a record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualitySummary {
    pub records: usize,
    pub unreadable_dates: usize,
    pub unreadable_amounts: usize,
    /// Missing amounts are summed as zero; counted for information only.
    pub absent_amounts: usize,
}

impl DataQualitySummary {
    pub fn is_clean(&self) -> bool {
        self.unreadable_dates == 0 && self.unreadable_amounts == 0
    }
}

/// List every record with an unreadable date or amount.
pub fn scan_records(records: &[TransactionRecord]) -> Vec<DataQualityWarning> {
    let mut warnings = Vec::new();

    for (index, record) in records.iter().enumerate() {
        if record.date.is_none() {
            warnings.push(DataQualityWarning::UnreadableDate {
                index,
                category: record.category.clone(),
                item: record.item.clone(),
            });
        }
        if let Amount::Unreadable(value) = &record.amount {
            warnings.push(DataQualityWarning::UnreadableAmount {
                index,
                value: value.clone(),
            });
        }
    }

    warnings
}

pub fn summarize(records: &[TransactionRecord]) -> DataQualitySummary {
    records.iter().fold(
        DataQualitySummary {
            records: records.len(),
            ..Default::default()
        },
        |mut summary, record| {
            if record.date.is_none() {
                summary.unreadable_dates += 1;
            }
            match record.amount {
                Amount::Unreadable(_) => summary.unreadable_amounts += 1,
                Amount::Absent => summary.absent_amounts += 1,
                Amount::Known(_) => {}
            }
            summary
        },
    )
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{TotalCents, TransactionRecord};

/// Key a breakdown groups records by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    /// Canonical category.
    Category,
    /// Product/line-item, verbatim.
    Item,
}

impl GroupBy {
    pub fn key(&self, record: &TransactionRecord) -> String {
        match self {
            GroupBy::Category => record.canonical_category(),
            GroupBy::Item => record.item.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub key: String,
    pub total: TotalCents,
}

/// Sum the amounts of every record. Unreadable amounts are skipped.
pub fn aggregate_scalar<'a, I>(records: I) -> TotalCents
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    records
        .into_iter()
        .filter_map(|r| r.amount.summable())
        .map(TotalCents::from)
        .sum()
}

/// Sum amounts per group key. Keys only appear when at least one record
/// carries them; a record whose amount is unreadable still makes its key
/// appear, with nothing added to the total.
pub fn aggregate<'a, I>(records: I, group_by: GroupBy) -> BTreeMap<String, GroupTotal>
where
    I: IntoIterator<Item = &'a TransactionRecord>,
{
    let mut groups: BTreeMap<String, GroupTotal> = BTreeMap::new();

    for record in records {
        let key = group_by.key(record);
        let entry = groups.entry(key.clone()).or_insert(GroupTotal { key, total: 0 });
        if let Some(cents) = record.amount.summable() {
            entry.total += TotalCents::from(cents);
        }
    }

    groups
}

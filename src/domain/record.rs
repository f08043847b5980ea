use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{canonical_category, parse_cents, Cents};

/// The received amount of a record as it was read from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "value")]
pub enum Amount {
    Known(Cents),
    /// No value at all. Sums treat it as zero.
    Absent,
    /// Text that could not be read as a number. Excluded from sums.
    Unreadable(String),
}

impl Amount {
    /// Interpret stored text. `None` and blank text are `Absent`.
    pub fn from_text(text: Option<&str>) -> Self {
        match text.map(str::trim) {
            None | Some("") => Amount::Absent,
            Some(s) => match parse_cents(s) {
                Ok(cents) => Amount::Known(cents),
                Err(_) => Amount::Unreadable(s.to_string()),
            },
        }
    }

    /// Contribution of this amount to a sum, if it has one.
    pub fn summable(&self) -> Option<Cents> {
        match self {
            Amount::Known(cents) => Some(*cents),
            Amount::Absent => Some(0),
            Amount::Unreadable(_) => None,
        }
    }
}

impl From<Cents> for Amount {
    fn from(cents: Cents) -> Self {
        Amount::Known(cents)
    }
}

/// One receivable entry. `date` is `None` when the stored date could not be
/// parsed; such records never fall into any period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: Option<NaiveDate>,
    pub category: String,
    pub item: String,
    pub amount: Amount,
}

impl TransactionRecord {
    pub fn new(
        date: NaiveDate,
        category: impl Into<String>,
        item: impl Into<String>,
        amount_cents: Cents,
    ) -> Self {
        Self {
            date: Some(date),
            category: category.into(),
            item: item.into(),
            amount: Amount::Known(amount_cents),
        }
    }

    /// Build a record from raw stored text, keeping unreadable values visible
    /// instead of failing.
    pub fn from_raw(
        date: Option<&str>,
        category: impl Into<String>,
        item: impl Into<String>,
        amount: Option<&str>,
    ) -> Self {
        Self {
            date: date.and_then(parse_record_date),
            category: category.into(),
            item: item.into(),
            amount: Amount::from_text(amount),
        }
    }

    pub fn canonical_category(&self) -> String {
        canonical_category(&self.category)
    }
}

/// Parse a stored date. Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, an RFC 3339
/// timestamp or a naive `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_record_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    None
}

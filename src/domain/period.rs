use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month. Ordering is (year, month) lexicographic, which is the
/// field order below. Serialized as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodSelector {
    year: i32,
    month: u32,
}

impl PeriodSelector {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// The month a date falls in.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The month immediately before this one. January rolls back to December
    /// of the previous year.
    pub fn prior_month(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for PeriodSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodSelector {
    type Err = PeriodError;

    /// Parse `YYYY-MM` (also accepts `YYYY/MM` and `MM/YYYY`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || PeriodError::InvalidSyntax(s.to_string());

        let (first, second) = s.split_once(['-', '/']).ok_or_else(invalid)?;
        let (year, month) = if first.len() == 4 {
            (first, second)
        } else {
            (second, first)
        };

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for PeriodSelector {
    type Error = PeriodError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PeriodSelector> for String {
    fn from(period: PeriodSelector) -> Self {
        period.to_string()
    }
}

/// What to do when the previous period does not precede the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnInvalidPeriod {
    /// Refuse to compute and report the error.
    #[default]
    Halt,
    /// Replace the previous period with the month right before the current one.
    AutoCorrectToPriorMonth,
}

impl OnInvalidPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnInvalidPeriod::Halt => "halt",
            OnInvalidPeriod::AutoCorrectToPriorMonth => "auto-correct",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "halt" => Some(OnInvalidPeriod::Halt),
            "auto-correct" | "autocorrect" | "auto-correct-to-prior-month" => {
                Some(OnInvalidPeriod::AutoCorrectToPriorMonth)
            }
            _ => None,
        }
    }
}

impl fmt::Display for OnInvalidPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The two periods a comparison runs over, after validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodPair {
    pub current: PeriodSelector,
    pub previous: PeriodSelector,
    /// Set when the operator's previous period was replaced by the policy.
    pub corrected_from: Option<PeriodSelector>,
}

/// Check that `previous` strictly precedes `current`.
pub fn validate(current: PeriodSelector, previous: PeriodSelector) -> Result<(), PeriodError> {
    if previous >= current {
        return Err(PeriodError::InvalidPeriodOrder { current, previous });
    }
    Ok(())
}

/// Validate the pair and apply `policy` when it is out of order.
pub fn resolve_periods(
    current: PeriodSelector,
    previous: PeriodSelector,
    policy: OnInvalidPeriod,
) -> Result<PeriodPair, PeriodError> {
    match validate(current, previous) {
        Ok(()) => Ok(PeriodPair {
            current,
            previous,
            corrected_from: None,
        }),
        Err(err) => match policy {
            OnInvalidPeriod::Halt => Err(err),
            OnInvalidPeriod::AutoCorrectToPriorMonth => Ok(PeriodPair {
                current,
                previous: current.prior_month(),
                corrected_from: Some(previous),
            }),
        },
    }
}

/// Default selection relative to `today`: the last closed month as current,
/// and the month before it as previous.
pub fn default_periods(today: NaiveDate) -> PeriodPair {
    let current = PeriodSelector::containing(today).prior_month();
    PeriodPair {
        current,
        previous: current.prior_month(),
        corrected_from: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    InvalidMonth(u32),
    InvalidSyntax(String),
    InvalidPeriodOrder {
        current: PeriodSelector,
        previous: PeriodSelector,
    },
}

impl fmt::Display for PeriodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodError::InvalidMonth(month) => {
                write!(f, "month must be between 1 and 12, got {}", month)
            }
            PeriodError::InvalidSyntax(s) => {
                write!(f, "invalid period '{}', expected YYYY-MM", s)
            }
            PeriodError::InvalidPeriodOrder { current, previous } => write!(
                f,
                "previous period {} must be earlier than current period {}",
                previous, current
            ),
        }
    }
}

impl std::error::Error for PeriodError {}

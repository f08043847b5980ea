use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{GroupTotal, TotalCents};

/// How a variation is reported when the previous total is zero, where the
/// ratio has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ZeroBaselinePolicy {
    /// No percentage; presentation decides the label.
    #[default]
    Undefined,
    /// Report 0%. Matches the historical dashboard, but hides new groups
    /// behind a value that also means "no change".
    ReportZero,
}

impl ZeroBaselinePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZeroBaselinePolicy::Undefined => "undefined",
            ZeroBaselinePolicy::ReportZero => "zero",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "undefined" | "none" | "n/a" => Some(ZeroBaselinePolicy::Undefined),
            "zero" | "report-zero" | "0" => Some(ZeroBaselinePolicy::ReportZero),
            _ => None,
        }
    }
}

impl std::fmt::Display for ZeroBaselinePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Change of one key between the previous and the current period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationResult {
    pub key: String,
    pub previous_total: TotalCents,
    pub current_total: TotalCents,
    /// Full precision; rounding is left to presentation.
    pub percent_change: Option<Decimal>,
    /// True when the percent change is negative.
    pub regressed: bool,
}

impl VariationResult {
    pub fn new(
        key: impl Into<String>,
        previous_total: TotalCents,
        current_total: TotalCents,
        policy: ZeroBaselinePolicy,
    ) -> Self {
        let percent_change = compare_scalar(previous_total, current_total, policy);
        Self {
            key: key.into(),
            previous_total,
            current_total,
            percent_change,
            regressed: is_regression(percent_change),
        }
    }
}

/// `(current - previous) / previous * 100`, subject to `policy` when
/// `previous` is zero.
///
/// Also `None` when the totals lie outside what `Decimal` can represent
/// (about 7.9e28 cents).
pub fn compare_scalar(
    previous: TotalCents,
    current: TotalCents,
    policy: ZeroBaselinePolicy,
) -> Option<Decimal> {
    if previous == 0 {
        return match policy {
            ZeroBaselinePolicy::Undefined => None,
            ZeroBaselinePolicy::ReportZero => Some(Decimal::ZERO),
        };
    }

    let change = Decimal::try_from_i128_with_scale(current - previous, 0).ok()?;
    let previous = Decimal::try_from_i128_with_scale(previous, 0).ok()?;
    // Multiply first so exact results such as -100 and 50 stay exact.
    change
        .checked_mul(Decimal::ONE_HUNDRED)?
        .checked_div(previous)
}

pub fn is_regression(percent_change: Option<Decimal>) -> bool {
    percent_change.is_some_and(|p| p.is_sign_negative() && !p.is_zero())
}

/// Compare two breakdowns. Every key present in either map is reported, in
/// ascending key order: a key missing on one side counts as zero there.
pub fn compare_groups(
    previous: &BTreeMap<String, GroupTotal>,
    current: &BTreeMap<String, GroupTotal>,
    policy: ZeroBaselinePolicy,
) -> Vec<VariationResult> {
    let keys: BTreeSet<&String> = previous.keys().chain(current.keys()).collect();

    keys.into_iter()
        .map(|key| {
            let previous_total = previous.get(key).map_or(0, |g| g.total);
            let current_total = current.get(key).map_or(0, |g| g.total);
            VariationResult::new(key.as_str(), previous_total, current_total, policy)
        })
        .collect()
}

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};

/// Money is represented as integer cents so that sums are exact and do not
/// depend on the order records are visited in.
/// For BRL/EUR/USD, 1 unit = 100 cents, so R$ 50,00 = 5000 cents.
pub type Cents = i64;

/// Sums of cents. Wide enough that no realistic count of `Cents` values can
/// overflow it.
pub type TotalCents = i128;

/// How amounts are rendered for display. Passed explicitly to the formatting
/// functions; nothing here touches process-wide locale settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoneyFormat {
    pub symbol: &'static str,
    pub decimal_separator: char,
    pub thousands_separator: Option<char>,
}

impl MoneyFormat {
    /// `1234.56`, no symbol and no grouping. Used for CSV/JSON output.
    pub const fn plain() -> Self {
        Self {
            symbol: "",
            decimal_separator: '.',
            thousands_separator: None,
        }
    }

    /// Brazilian real: `R$ 1.234,56`.
    pub const fn pt_br() -> Self {
        Self {
            symbol: "R$",
            decimal_separator: ',',
            thousands_separator: Some('.'),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "plain" => Some(Self::plain()),
            "pt-br" | "pt_br" | "brl" => Some(Self::pt_br()),
            _ => None,
        }
    }
}

impl Default for MoneyFormat {
    fn default() -> Self {
        Self::plain()
    }
}

/// Format cents as a currency string.
/// Example with `plain`: 5000 -> "50.00", -1234 -> "-12.34".
/// Example with `pt_br`: 123456 -> "R$ 1.234,56".
pub fn format_cents(cents: impl Into<TotalCents>, format: &MoneyFormat) -> String {
    let cents: TotalCents = cents.into();
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = (abs_cents / 100).to_string();
    let remainder = abs_cents % 100;

    let units = match format.thousands_separator {
        Some(sep) => group_digits(&units, sep),
        None => units,
    };

    let number = format!("{}{}{}{:02}", sign, units, format.decimal_separator, remainder);
    if format.symbol.is_empty() {
        number
    } else {
        format!("{} {}", format.symbol, number)
    }
}

fn group_digits(digits: &str, sep: char) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

/// Format a percent change at two decimal places, or `n/a` when the ratio is
/// undefined. Rounding happens only here.
pub fn format_percent(percent: Option<Decimal>) -> String {
    match percent {
        Some(p) => {
            let rounded = p.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{:.2}%", rounded)
        }
        None => "n/a".to_string(),
    }
}

/// Parse a decimal string into cents.
///
/// Accepts one optional leading sign. A dot or a comma may be the decimal
/// separator. When both appear, the last one is the decimal separator and the
/// other is grouping. A separator repeated with nothing else is grouping, as
/// in `1.234.567`. Grouped digits must come in groups of three.
///
/// A third fraction digit or beyond is accepted only when it is zero, so no
/// value is silently rounded.
/// Example: "50.00" -> 5000, "12,5" -> 1250, "1.234,56" -> 123456, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    if !body.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') {
        return Err(ParseAmountError::InvalidFormat);
    }

    let (int_part, frac_part) = split_amount(body)?;
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(ParseAmountError::InvalidFormat);
    }

    let units: i64 = if int_part.is_empty() {
        0
    } else {
        // Only digits are left, so a failure here is a value too large.
        int_part.parse().map_err(|_| ParseAmountError::Overflow)?
    };

    let (kept, extra) = frac_part.split_at(frac_part.len().min(2));
    if extra.chars().any(|c| c != '0') {
        return Err(ParseAmountError::ExcessPrecision);
    }
    let decimal_cents: i64 = match kept.len() {
        0 => 0,
        1 => kept.parse::<i64>().map_err(|_| ParseAmountError::InvalidFormat)? * 10,
        _ => kept.parse().map_err(|_| ParseAmountError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseAmountError::Overflow)?;
    Ok(if negative { -cents } else { cents })
}

/// Split an unsigned amount into integer digits (grouping removed) and
/// fraction digits.
fn split_amount(body: &str) -> Result<(String, &str), ParseAmountError> {
    let dots = body.matches('.').count();
    let commas = body.matches(',').count();

    let (grouping, decimal) = match (dots, commas) {
        (0, 0) => (None, None),
        (1, 0) => (None, Some('.')),
        (0, 1) => (None, Some(',')),
        (_, 0) => (Some('.'), None),
        (0, _) => (Some(','), None),
        _ => {
            let last = body
                .rfind(['.', ','])
                .map(|pos| body.as_bytes()[pos] as char)
                .ok_or(ParseAmountError::InvalidFormat)?;
            let (decimal, grouping) = if last == ',' { (',', '.') } else { ('.', ',') };
            if body.matches(decimal).count() > 1 {
                return Err(ParseAmountError::InvalidFormat);
            }
            (Some(grouping), Some(decimal))
        }
    };

    let (int_part, frac_part) = match decimal {
        Some(sep) => body.rsplit_once(sep).ok_or(ParseAmountError::InvalidFormat)?,
        None => (body, ""),
    };
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseAmountError::InvalidFormat);
    }

    let int_digits = match grouping {
        Some(sep) => ungroup(int_part, sep)?,
        None => int_part.to_string(),
    };
    Ok((int_digits, frac_part))
}

fn ungroup(digits: &str, sep: char) -> Result<String, ParseAmountError> {
    let mut out = String::with_capacity(digits.len());
    for (i, group) in digits.split(sep).enumerate() {
        let valid = if i == 0 {
            (1..=3).contains(&group.len())
        } else {
            group.len() == 3
        };
        if !valid {
            return Err(ParseAmountError::InvalidFormat);
        }
        out.push_str(group);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat,
    /// Non-zero digits past the second fraction digit.
    ExcessPrecision,
    Overflow,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "empty amount"),
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
            ParseAmountError::ExcessPrecision => {
                write!(f, "more than two decimal places")
            }
            ParseAmountError::Overflow => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

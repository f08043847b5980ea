//! Runtime configuration: where the store lives, how the engine treats
//! invalid periods and zero baselines, and how money is displayed.
//!
//! Every value comes from a command-line flag or, failing that, an
//! environment variable (a `.env` file in the working directory is loaded
//! first). See `cli::Cli` for the flag and variable names.

use std::path::PathBuf;

use crate::domain::{MoneyFormat, OnInvalidPeriod, Settings, ZeroBaselinePolicy};

pub const ENV_DATABASE: &str = "RECEITA_DATABASE";
pub const ENV_ON_INVALID_PERIOD: &str = "RECEITA_ON_INVALID_PERIOD";
pub const ENV_ZERO_BASELINE: &str = "RECEITA_ZERO_BASELINE";
pub const ENV_LOCALE: &str = "RECEITA_LOCALE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database: String,
    pub settings: Settings,
    pub money_format: MoneyFormat,
}

/// Load variables from `.env` if the file exists. A missing file is not an
/// error and yields `Ok(None)`.
pub fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn parse_on_invalid_period(s: &str) -> Result<OnInvalidPeriod, String> {
    OnInvalidPeriod::from_str(s)
        .ok_or_else(|| format!("invalid policy '{}', expected halt or auto-correct", s))
}

pub fn parse_zero_baseline(s: &str) -> Result<ZeroBaselinePolicy, String> {
    ZeroBaselinePolicy::from_str(s)
        .ok_or_else(|| format!("invalid policy '{}', expected undefined or zero", s))
}

pub fn parse_money_format(s: &str) -> Result<MoneyFormat, String> {
    MoneyFormat::from_str(s).ok_or_else(|| format!("invalid locale '{}', expected plain or pt-br", s))
}

use thiserror::Error;

use crate::domain::{PeriodError, PeriodSelector};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Previous period {previous} must be earlier than current period {current}")]
    InvalidPeriodOrder {
        current: PeriodSelector,
        previous: PeriodSelector,
    },

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<PeriodError> for AppError {
    fn from(err: PeriodError) -> Self {
        match err {
            PeriodError::InvalidPeriodOrder { current, previous } => {
                AppError::InvalidPeriodOrder { current, previous }
            }
            other => AppError::InvalidPeriod(other.to_string()),
        }
    }
}

//! Report error types.

use chrono::NaiveDate;
use inventra_shared::{AppError, types::AccountId};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Invalid date range.
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },
}

impl From<ReportError> for AppError {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            ReportError::InvalidDateRange { .. } => Self::Validation(err.to_string()),
        }
    }
}

//! Application-wide error types.
//!
//! Every domain and repository error in the workspace collapses into one of
//! these variants at the boundary, so callers only have to handle a fixed
//! taxonomy.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input: negative quantity or price, missing required field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced part, account or document does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Ledger lines do not balance.
    #[error("Unbalanced entry: debit {debit} != credit {credit}")]
    UnbalancedEntry {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// Deleting a record still referenced by transactions.
    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    /// Conflicting state, e.g. a document that was already received.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) | Self::ReferentialIntegrity(_) => 409,
            Self::UnbalancedEntry { .. } => 422,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::UnbalancedEntry { .. } => "UNBALANCED_ENTRY",
            Self::ReferentialIntegrity(_) => "REFERENTIAL_INTEGRITY",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(
        AppError::UnbalancedEntry { debit: dec!(1), credit: dec!(2) },
        422,
        "UNBALANCED_ENTRY"
    )]
    #[case(AppError::ReferentialIntegrity(String::new()), 409, "REFERENTIAL_INTEGRITY")]
    #[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Validation("quantity must not be negative".into()).to_string(),
            "Validation error: quantity must not be negative"
        );
        assert_eq!(
            AppError::UnbalancedEntry {
                debit: dec!(100.00),
                credit: dec!(50.00),
            }
            .to_string(),
            "Unbalanced entry: debit 100.00 != credit 50.00"
        );
        assert_eq!(
            AppError::ReferentialIntegrity("account 1000 has 3 lines".into()).to_string(),
            "Referential integrity violation: account 1000 has 3 lines"
        );
    }
}

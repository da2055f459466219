//! Costing error types.

use inventra_shared::{AppError, types::PartId};
use thiserror::Error;

/// Errors raised by the costing engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CostingError {
    /// A quantity or amount failed validation.
    #[error("{field} {reason}")]
    Validation {
        /// The offending input.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// A line references a part with no snapshot.
    #[error("Part not found: {0}")]
    PartNotFound(PartId),

    /// Expenses were given but there are no lines to carry them.
    #[error("Cannot distribute an expense of {0} over zero items")]
    NoItemsForExpense(rust_decimal::Decimal),

    /// Arithmetic overflowed the decimal range.
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}

impl CostingError {
    pub(crate) const fn negative(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "must not be negative",
        }
    }

    pub(crate) const fn not_positive(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "must be greater than zero",
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::NoItemsForExpense(_) => "VALIDATION_ERROR",
            Self::PartNotFound(_) => "PART_NOT_FOUND",
            Self::Overflow(_) => "ARITHMETIC_OVERFLOW",
        }
    }
}

impl From<CostingError> for AppError {
    fn from(err: CostingError) -> Self {
        match err {
            CostingError::PartNotFound(_) => Self::NotFound(err.to_string()),
            CostingError::Overflow(_) => Self::Internal(err.to_string()),
            CostingError::Validation { .. } | CostingError::NoItemsForExpense(_) => {
                Self::Validation(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = CostingError::negative("incoming_qty");
        assert_eq!(err.to_string(), "incoming_qty must not be negative");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_maps_into_app_error() {
        let app: AppError = CostingError::PartNotFound(PartId::new()).into();
        assert_eq!(app.status_code(), 404);

        let app: AppError = CostingError::not_positive("quantity").into();
        assert_eq!(app.status_code(), 400);
    }
}

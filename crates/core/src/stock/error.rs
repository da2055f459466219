//! Stock error types.

use inventra_shared::{AppError, types::PartId};
use thiserror::Error;

/// Errors raised by stock rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StockError {
    /// Movement quantities must be positive.
    #[error("Movement quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    /// Not enough stock on hand to issue.
    #[error("Insufficient stock for part {part_id}: requested {requested}, available {available}")]
    InsufficientStock {
        /// The part being issued.
        part_id: PartId,
        /// Total quantity requested.
        requested: i64,
        /// Quantity on hand.
        available: i64,
    },
}

impl StockError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
        }
    }
}

impl From<StockError> for AppError {
    fn from(err: StockError) -> Self {
        Self::Validation(err.to_string())
    }
}

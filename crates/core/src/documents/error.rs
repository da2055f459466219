//! Document lifecycle error types.

use inventra_shared::AppError;
use thiserror::Error;

use crate::costing::CostingError;
use crate::ledger::LedgerError;
use crate::stock::StockError;

/// Errors raised while planning document transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// The requested transition is not allowed from the current status.
    #[error("Invalid {document} transition from {from} to {to}")]
    InvalidTransition {
        /// Document kind.
        document: &'static str,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// The document was already received or posted.
    #[error("{document} was already processed (status {status})")]
    AlreadyProcessed {
        /// Document kind.
        document: &'static str,
        /// Status found.
        status: String,
    },

    /// A document needs at least one item.
    #[error("Document has no items")]
    NoItems,

    /// A line failed validation.
    #[error("{field} {reason}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Costing failed.
    #[error(transparent)]
    Costing(#[from] CostingError),

    /// The generated entry failed ledger validation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A stock rule failed.
    #[error(transparent)]
    Stock(#[from] StockError),
}

impl DocumentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::AlreadyProcessed { .. } => "ALREADY_PROCESSED",
            Self::NoItems | Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Costing(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Stock(e) => e.error_code(),
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::InvalidTransition { .. } | DocumentError::AlreadyProcessed { .. } => {
                Self::Conflict(err.to_string())
            }
            DocumentError::NoItems | DocumentError::Validation { .. } => {
                Self::Validation(err.to_string())
            }
            DocumentError::Costing(e) => e.into(),
            DocumentError::Ledger(e) => e.into(),
            DocumentError::Stock(e) => e.into(),
        }
    }
}

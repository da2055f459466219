//! Catalog error types.

use inventra_shared::AppError;
use thiserror::Error;

/// Errors raised by catalog rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Invalid part or reference data.
    #[error("{field} {reason}")]
    Validation {
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Another part already uses this number.
    #[error("Part number already exists: {0}")]
    DuplicatePartNo(String),

    /// No part with this number.
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// The record is still referenced by documents or movements.
    #[error("{entity} {key} is referenced by {references} record(s)")]
    InUse {
        /// Kind of record being deleted.
        entity: &'static str,
        /// Its code or part number.
        key: String,
        /// Number of referencing rows.
        references: u64,
    },
}

impl CatalogError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::DuplicatePartNo(_) => "DUPLICATE_PART_NO",
            Self::PartNotFound(_) => "PART_NOT_FOUND",
            Self::InUse { .. } => "RECORD_IN_USE",
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation { .. } => Self::Validation(err.to_string()),
            CatalogError::DuplicatePartNo(_) => Self::Conflict(err.to_string()),
            CatalogError::PartNotFound(_) => Self::NotFound(err.to_string()),
            CatalogError::InUse { .. } => Self::ReferentialIntegrity(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_use_is_referential_integrity() {
        let err = CatalogError::InUse {
            entity: "part",
            key: "6C0570".to_string(),
            references: 3,
        };
        assert_eq!(err.to_string(), "part 6C0570 is referenced by 3 record(s)");
        let app: AppError = err.into();
        assert_eq!(app.error_code(), "REFERENTIAL_INTEGRITY");
    }
}

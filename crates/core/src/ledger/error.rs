//! Ledger error types.

use inventra_shared::AppError;
use inventra_shared::types::{AccountId, LedgerEntryId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while validating or posting ledger entries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// An entry needs at least two lines.
    #[error("Entry must have at least 2 lines")]
    InsufficientLines,

    /// Debits and credits differ.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit.
        debit: Decimal,
        /// Total credit.
        credit: Decimal,
    },

    /// A line has neither a debit nor a credit.
    #[error("Line amount cannot be zero")]
    ZeroAmount,

    /// A line carries a negative amount.
    #[error("Line amount cannot be negative")]
    NegativeAmount,

    /// A line carries both a debit and a credit.
    #[error("Line must specify either debit or credit, not both")]
    BothSides,

    /// All lines are on the same side.
    #[error("Entry must have both debit and credit lines")]
    SingleSided,

    /// A line amount has more decimal places than the ledger stores.
    #[error("Line amount {0} has more than {scale} decimal places", scale = crate::costing::MONEY_SCALE)]
    ExcessPrecision(Decimal),

    /// Line totals overflowed the decimal range.
    #[error("Entry totals overflow")]
    TotalOverflow,

    /// Vouchers need a voucher type, journal entries must not have one.
    #[error("Voucher type does not match entry kind")]
    VoucherTypeMismatch,

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Account still has ledger lines.
    #[error("Account {account_id} has {lines} ledger line(s)")]
    AccountInUse {
        /// The account.
        account_id: AccountId,
        /// Number of lines referencing it.
        lines: u64,
    },

    // ========== Entry State Errors ==========
    /// Entry not found.
    #[error("Entry not found: {0}")]
    EntryNotFound(LedgerEntryId),

    /// The entry was already posted.
    #[error("Entry {0} is already posted")]
    AlreadyPosted(LedgerEntryId),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::ZeroAmount => "ZERO_AMOUNT",
            Self::NegativeAmount => "NEGATIVE_AMOUNT",
            Self::BothSides => "INVALID_LINE_SIDE",
            Self::SingleSided => "SINGLE_SIDED_ENTRY",
            Self::ExcessPrecision(_) => "EXCESS_PRECISION",
            Self::TotalOverflow => "TOTAL_OVERFLOW",
            Self::VoucherTypeMismatch => "VOUCHER_TYPE_MISMATCH",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AccountInUse { .. } => "ACCOUNT_IN_USE",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::AlreadyPosted(_) => "ALREADY_POSTED",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unbalanced { debit, credit } => Self::UnbalancedEntry { debit, credit },
            LedgerError::AccountNotFound(_) | LedgerError::EntryNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            LedgerError::AccountInUse { .. } => Self::ReferentialIntegrity(err.to_string()),
            LedgerError::AlreadyPosted(_) => Self::Conflict(err.to_string()),
            LedgerError::InsufficientLines
            | LedgerError::ZeroAmount
            | LedgerError::NegativeAmount
            | LedgerError::BothSides
            | LedgerError::SingleSided
            | LedgerError::ExcessPrecision(_)
            | LedgerError::TotalOverflow
            | LedgerError::VoucherTypeMismatch
            | LedgerError::AccountInactive(_) => Self::Validation(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unbalanced_maps_to_unbalanced_entry() {
        let err = LedgerError::Unbalanced {
            debit: dec!(100.00),
            credit: dec!(50.00),
        };
        assert_eq!(err.to_string(), "Entry is not balanced. Debit: 100.00, Credit: 50.00");

        let app: AppError = err.into();
        assert!(matches!(app, AppError::UnbalancedEntry { .. }));
        assert_eq!(app.status_code(), 422);
    }

    #[test]
    fn test_status_mapping() {
        let app: AppError = LedgerError::AlreadyPosted(LedgerEntryId::new()).into();
        assert_eq!(app.status_code(), 409);

        let app: AppError = LedgerError::AccountInUse {
            account_id: AccountId::new(),
            lines: 2,
        }
        .into();
        assert_eq!(app.error_code(), "REFERENTIAL_INTEGRITY");

        let app: AppError = LedgerError::ZeroAmount.into();
        assert_eq!(app.status_code(), 400);
    }
}

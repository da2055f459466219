//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - One entry type for both journal entries and vouchers
//! - Line validation (balanced, two-sided, no negative or zero lines)
//! - Balance deltas signed by each account's normal balance
//! - Reversal deltas and balance recomputation for reconciliation

mod balance;
mod error;
mod service;
mod types;
mod validation;

pub use balance::{BalanceDelta, posting_deltas, recompute_balance, reversal_deltas};
pub use error::LedgerError;
pub use service::{LedgerService, PreparedPosting};
pub use types::{
    AccountInfo, AccountType, EntryInput, EntryKind, EntryStatus, EntryTotals, LineInput,
    NormalBalance, VoucherType, format_entry_no,
};
pub use validation::{validate_entry, validate_lines};

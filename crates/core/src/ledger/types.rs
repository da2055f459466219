//! Ledger domain types.
//!
//! Journal entries and vouchers share one representation, [`EntryKind`]
//! tags which book an entry belongs to.

use chrono::NaiveDate;
use inventra_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::stock::DocumentRef;

/// Chart-of-accounts classification carried by a main group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Resources owned.
    Asset,
    /// Obligations owed.
    Liability,
    /// Owner's interest.
    Equity,
    /// Income from sales.
    Revenue,
    /// Operating expenses.
    Expense,
    /// Direct costs such as cost of goods sold.
    Cost,
}

impl AccountType {
    /// Side on which this account type increases.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense | Self::Cost => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Returns true for revenue, cost and expense accounts.
    #[must_use]
    pub const fn is_income_statement(self) -> bool {
        matches!(self, Self::Revenue | Self::Cost | Self::Expense)
    }

    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
            Self::Cost => "cost",
        }
    }
}

/// Normal balance side of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalBalance {
    /// Asset, expense and cost accounts.
    Debit,
    /// Liability, equity and revenue accounts.
    Credit,
}

impl NormalBalance {
    /// Balance change caused by one line.
    ///
    /// - Debit-normal: `debit - credit`
    /// - Credit-normal: `credit - debit`
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self {
            Self::Debit => debit - credit,
            Self::Credit => credit - debit,
        }
    }
}

/// Which book an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// General journal entry.
    Journal,
    /// Cash/bank voucher.
    Voucher,
}

/// Voucher sub-type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoucherType {
    /// Money paid out.
    Payment,
    /// Money received.
    Receipt,
    /// Non-cash voucher.
    Journal,
    /// Transfer between cash and bank accounts.
    Contra,
}

impl VoucherType {
    /// Prefix used for voucher numbers.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Payment => "PV",
            Self::Receipt => "RV",
            Self::Journal => "JV",
            Self::Contra => "CV",
        }
    }
}

/// Entry status. Only posted entries touch balances and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Editable, no balance effect.
    Draft,
    /// Applied to account balances.
    Posted,
}

/// One debit or credit line of an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    pub account_id: AccountId,
    pub debit: Decimal,
    pub credit: Decimal,
    pub memo: Option<String>,
}

impl LineInput {
    /// A debit line.
    #[must_use]
    pub const fn debit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            memo: None,
        }
    }

    /// A credit line.
    #[must_use]
    pub const fn credit(account_id: AccountId, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            memo: None,
        }
    }

    /// Attaches a memo.
    #[must_use]
    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Everything needed to write one ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInput {
    pub kind: EntryKind,
    /// Required for vouchers, absent for journal entries.
    pub voucher_type: Option<VoucherType>,
    pub entry_date: NaiveDate,
    pub description: String,
    /// Document that produced this entry, if any.
    pub reference: Option<DocumentRef>,
    pub lines: Vec<LineInput>,
}

impl EntryInput {
    /// Prefix used when numbering this entry.
    #[must_use]
    pub fn number_prefix(&self) -> &'static str {
        match (self.kind, self.voucher_type) {
            (EntryKind::Voucher, Some(voucher_type)) => voucher_type.prefix(),
            _ => "JE",
        }
    }
}

/// Formats a sequential entry number, e.g. `JE-000042`.
#[must_use]
pub fn format_entry_no(prefix: &str, sequence: u64) -> String {
    format!("{prefix}-{sequence:06}")
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryTotals {
    pub debit: Decimal,
    pub credit: Decimal,
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Creates totals from debit and credit sums.
    #[must_use]
    pub fn new(debit: Decimal, credit: Decimal) -> Self {
        Self {
            debit,
            credit,
            is_balanced: debit == credit,
        }
    }

    /// Returns `debit - credit`.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Account facts the posting logic needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub id: AccountId,
    pub code: String,
    pub account_type: AccountType,
    pub is_active: bool,
}

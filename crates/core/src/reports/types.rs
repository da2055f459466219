//! Report data types.

use chrono::NaiveDate;
use inventra_shared::types::{AccountId, LedgerEntryId, MainGroupId, PartId, StoreId, SubgroupId};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::ledger::{AccountType, EntryKind};

/// Chart-of-accounts row with its hierarchy, as loaded for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartAccount {
    /// Account ID.
    pub id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Type inherited from the main group.
    pub account_type: AccountType,
    /// Owning main group.
    pub main_group_id: MainGroupId,
    /// Main group name.
    pub main_group_name: String,
    /// Owning subgroup.
    pub subgroup_id: SubgroupId,
    /// Subgroup name.
    pub subgroup_name: String,
    /// Balance before any ledger line.
    pub opening_balance: Decimal,
    /// Cached running balance.
    pub current_balance: Decimal,
}

/// A line of a posted entry, joined with its entry header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostedLine {
    /// Entry ID.
    pub entry_id: LedgerEntryId,
    /// Entry number.
    pub entry_no: String,
    /// Journal or voucher.
    pub kind: EntryKind,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Entry description.
    pub description: String,
    /// Account posted to.
    pub account_id: AccountId,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
}

/// Account balance for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Total debit of the lines considered.
    pub total_debit: Decimal,
    /// Total credit of the lines considered.
    pub total_credit: Decimal,
    /// Net balance on the account's normal side.
    pub balance: Decimal,
}

/// Trial balance row. Exactly one side is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceRow {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Account type.
    pub account_type: AccountType,
    /// Net debit position.
    pub debit: Decimal,
    /// Net credit position.
    pub credit: Decimal,
}

/// Trial balance totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrialBalanceTotals {
    /// Total debit.
    pub total_debit: Decimal,
    /// Total credit.
    pub total_credit: Decimal,
    /// Whether debits equal credits.
    pub is_balanced: bool,
}

/// Trial balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialBalanceReport {
    /// As of date.
    pub as_of: NaiveDate,
    /// One row per account, ordered by code.
    pub rows: Vec<TrialBalanceRow>,
    /// Totals.
    pub totals: TrialBalanceTotals,
}

/// Accounts of one subgroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubgroupSection {
    /// Subgroup ID.
    pub id: SubgroupId,
    /// Subgroup name.
    pub name: String,
    /// Sum of account balances.
    pub total: Decimal,
    /// Accounts, ordered by code.
    pub accounts: Vec<AccountBalance>,
}

/// Subgroups of one main group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainGroupSection {
    /// Main group ID.
    pub id: MainGroupId,
    /// Main group name.
    pub name: String,
    /// Sum of subgroup totals.
    pub total: Decimal,
    /// Subgroups, ordered by name.
    pub subgroups: Vec<SubgroupSection>,
}

/// Every account of one account type, grouped by hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatementSection {
    /// Section total.
    pub total: Decimal,
    /// Main groups, ordered by name.
    pub groups: Vec<MainGroupSection>,
}

/// Balance sheet report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSheetReport {
    /// As of date.
    pub as_of: NaiveDate,
    /// Assets.
    pub assets: StatementSection,
    /// Liabilities.
    pub liabilities: StatementSection,
    /// Equity accounts.
    pub equity: StatementSection,
    /// Revenue less cost and expense, not yet closed into equity.
    pub current_earnings: Decimal,
    /// Equity accounts plus current earnings.
    pub total_equity: Decimal,
    /// Liabilities plus total equity.
    pub liabilities_and_equity: Decimal,
    /// Whether assets equal liabilities plus equity.
    pub is_balanced: bool,
}

/// Income statement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncomeStatementReport {
    /// Period start, inclusive.
    pub from: NaiveDate,
    /// Period end, inclusive.
    pub to: NaiveDate,
    /// Revenue.
    pub revenue: StatementSection,
    /// Direct costs (COGS).
    pub cost: StatementSection,
    /// Revenue less cost.
    pub gross_profit: Decimal,
    /// Operating expenses.
    pub expense: StatementSection,
    /// Gross profit less expenses.
    pub net_income: Decimal,
}

/// One line on an account ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountLedgerRow {
    /// Entry ID.
    pub entry_id: LedgerEntryId,
    /// Entry number.
    pub entry_no: String,
    /// Entry date.
    pub entry_date: NaiveDate,
    /// Description.
    pub description: String,
    /// Debit amount.
    pub debit: Decimal,
    /// Credit amount.
    pub credit: Decimal,
    /// Balance after this line.
    pub running_balance: Decimal,
}

/// Account ledger report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountLedgerReport {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Period start, inclusive.
    pub from: NaiveDate,
    /// Period end, inclusive.
    pub to: NaiveDate,
    /// Balance at the end of the day before `from`.
    pub opening_balance: Decimal,
    /// Lines in date order.
    pub rows: Vec<AccountLedgerRow>,
    /// Total debit within the period.
    pub total_debit: Decimal,
    /// Total credit within the period.
    pub total_credit: Decimal,
    /// Balance at the end of `to`.
    pub closing_balance: Decimal,
}

/// Cached balance that disagrees with the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceDiscrepancy {
    /// Account ID.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// `current_balance` as stored.
    pub cached: Decimal,
    /// Opening balance plus every posted line.
    pub recomputed: Decimal,
    /// `cached - recomputed`.
    pub difference: Decimal,
}

/// Outcome of comparing cached balances against the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    /// Number of accounts compared.
    pub accounts_checked: usize,
    /// Accounts that drifted.
    pub discrepancies: Vec<BalanceDiscrepancy>,
}

impl ReconciliationReport {
    /// Returns true when no account drifted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Stock on hand and valuation for one part in one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReportRow {
    /// Part ID.
    pub part_id: PartId,
    /// Part number.
    pub part_no: String,
    /// Store, `None` for unassigned stock.
    pub store_id: Option<StoreId>,
    /// Quantity on hand.
    pub quantity: i64,
    /// Current unit cost.
    pub unit_cost: Decimal,
    /// `quantity * unit_cost`.
    pub value: Decimal,
}

/// Stock report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReport {
    /// Rows ordered by part number then store.
    pub rows: Vec<StockReportRow>,
    /// Sum of quantities.
    pub total_quantity: i64,
    /// Sum of values.
    pub total_value: Decimal,
}

//! Report generation service.
//!
//! Every figure is derived from posted ledger lines and opening balances;
//! the cached `current_balance` is only read by [`ReportService::reconcile`].

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use inventra_shared::types::{AccountId, MainGroupId, PartId, SubgroupId};
use rust_decimal::Decimal;

use super::error::ReportError;
use super::types::{
    AccountBalance, AccountLedgerReport, AccountLedgerRow, BalanceDiscrepancy,
    BalanceSheetReport, ChartAccount, IncomeStatementReport, MainGroupSection, PostedLine,
    ReconciliationReport, StatementSection, StockReport, StockReportRow, SubgroupSection,
    TrialBalanceReport, TrialBalanceRow, TrialBalanceTotals,
};
use crate::catalog::PartSnapshot;
use crate::costing::round_money;
use crate::ledger::{AccountType, NormalBalance, recompute_balance};
use crate::stock::StockLevel;

/// Service for generating financial reports.
pub struct ReportService;

type Totals = HashMap<AccountId, (Decimal, Decimal)>;

impl ReportService {
    /// Trial balance as of a date, inclusive.
    ///
    /// Each account shows its net position on one side. Opening balances
    /// count on the account's normal side.
    #[must_use]
    pub fn trial_balance(
        as_of: NaiveDate,
        accounts: &[ChartAccount],
        lines: &[PostedLine],
    ) -> TrialBalanceReport {
        let totals = Self::sum_lines(lines.iter().filter(|l| l.entry_date <= as_of));

        let mut rows: Vec<TrialBalanceRow> = accounts
            .iter()
            .map(|account| {
                let (debit, credit) = totals.get(&account.id).copied().unwrap_or_default();
                let opening_debit = match account.account_type.normal_balance() {
                    NormalBalance::Debit => account.opening_balance,
                    NormalBalance::Credit => -account.opening_balance,
                };
                let net = opening_debit + debit - credit;
                TrialBalanceRow {
                    account_id: account.id,
                    code: account.code.clone(),
                    name: account.name.clone(),
                    account_type: account.account_type,
                    debit: net.max(Decimal::ZERO),
                    credit: (-net).max(Decimal::ZERO),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));

        let total_debit: Decimal = rows.iter().map(|r| r.debit).sum();
        let total_credit: Decimal = rows.iter().map(|r| r.credit).sum();

        TrialBalanceReport {
            as_of,
            rows,
            totals: TrialBalanceTotals {
                total_debit,
                total_credit,
                is_balanced: total_debit == total_credit,
            },
        }
    }

    /// Balance sheet as of a date, inclusive.
    ///
    /// Revenue, cost and expense balances are folded into equity as current
    /// earnings, so the sheet balances whenever the ledger does.
    #[must_use]
    pub fn balance_sheet(
        as_of: NaiveDate,
        accounts: &[ChartAccount],
        lines: &[PostedLine],
    ) -> BalanceSheetReport {
        let totals = Self::sum_lines(lines.iter().filter(|l| l.entry_date <= as_of));
        let balances = Self::account_balances(accounts, &totals, true);

        let assets = Self::build_section(&balances, AccountType::Asset);
        let liabilities = Self::build_section(&balances, AccountType::Liability);
        let equity = Self::build_section(&balances, AccountType::Equity);

        let type_total = |account_type: AccountType| -> Decimal {
            balances
                .iter()
                .filter(|(a, _)| a.account_type == account_type)
                .map(|(_, b)| b.balance)
                .sum()
        };
        let current_earnings = type_total(AccountType::Revenue)
            - type_total(AccountType::Cost)
            - type_total(AccountType::Expense);

        let total_equity = equity.total + current_earnings;
        let liabilities_and_equity = liabilities.total + total_equity;

        BalanceSheetReport {
            as_of,
            is_balanced: assets.total == liabilities_and_equity,
            assets,
            liabilities,
            equity,
            current_earnings,
            total_equity,
            liabilities_and_equity,
        }
    }

    /// Income statement for a closed date range.
    pub fn income_statement(
        from: NaiveDate,
        to: NaiveDate,
        accounts: &[ChartAccount],
        lines: &[PostedLine],
    ) -> Result<IncomeStatementReport, ReportError> {
        Self::check_range(from, to)?;

        let totals = Self::sum_lines(
            lines
                .iter()
                .filter(|l| l.entry_date >= from && l.entry_date <= to),
        );
        let balances = Self::account_balances(accounts, &totals, false);

        let revenue = Self::build_section(&balances, AccountType::Revenue);
        let cost = Self::build_section(&balances, AccountType::Cost);
        let expense = Self::build_section(&balances, AccountType::Expense);

        let gross_profit = revenue.total - cost.total;
        let net_income = gross_profit - expense.total;

        Ok(IncomeStatementReport {
            from,
            to,
            revenue,
            cost,
            gross_profit,
            expense,
            net_income,
        })
    }

    /// Ledger of one account with opening and running balances.
    pub fn account_ledger(
        account: &ChartAccount,
        from: NaiveDate,
        to: NaiveDate,
        lines: &[PostedLine],
    ) -> Result<AccountLedgerReport, ReportError> {
        Self::check_range(from, to)?;

        let normal = account.account_type.normal_balance();
        let mut own: Vec<&PostedLine> = lines
            .iter()
            .filter(|l| l.account_id == account.id && l.entry_date <= to)
            .collect();
        own.sort_by(|a, b| {
            a.entry_date
                .cmp(&b.entry_date)
                .then_with(|| a.entry_no.cmp(&b.entry_no))
        });

        let opening_balance = own
            .iter()
            .filter(|l| l.entry_date < from)
            .fold(account.opening_balance, |balance, l| {
                balance + normal.balance_change(l.debit, l.credit)
            });

        let mut running = opening_balance;
        let mut total_debit = Decimal::ZERO;
        let mut total_credit = Decimal::ZERO;
        let rows: Vec<AccountLedgerRow> = own
            .into_iter()
            .filter(|l| l.entry_date >= from)
            .map(|l| {
                running += normal.balance_change(l.debit, l.credit);
                total_debit += l.debit;
                total_credit += l.credit;
                AccountLedgerRow {
                    entry_id: l.entry_id,
                    entry_no: l.entry_no.clone(),
                    entry_date: l.entry_date,
                    description: l.description.clone(),
                    debit: l.debit,
                    credit: l.credit,
                    running_balance: running,
                }
            })
            .collect();

        Ok(AccountLedgerReport {
            account_id: account.id,
            code: account.code.clone(),
            name: account.name.clone(),
            from,
            to,
            opening_balance,
            rows,
            total_debit,
            total_credit,
            closing_balance: running,
        })
    }

    /// Compares each cached balance with opening balance plus posted lines.
    #[must_use]
    pub fn reconcile(accounts: &[ChartAccount], lines: &[PostedLine]) -> ReconciliationReport {
        let mut by_account: HashMap<AccountId, Vec<(Decimal, Decimal)>> = HashMap::new();
        for line in lines {
            by_account
                .entry(line.account_id)
                .or_default()
                .push((line.debit, line.credit));
        }

        let mut discrepancies: Vec<BalanceDiscrepancy> = accounts
            .iter()
            .filter_map(|account| {
                let recomputed = recompute_balance(
                    account.account_type,
                    account.opening_balance,
                    by_account.remove(&account.id).unwrap_or_default(),
                );
                (recomputed != account.current_balance).then(|| BalanceDiscrepancy {
                    account_id: account.id,
                    code: account.code.clone(),
                    cached: account.current_balance,
                    recomputed,
                    difference: account.current_balance - recomputed,
                })
            })
            .collect();
        discrepancies.sort_by(|a, b| a.code.cmp(&b.code));

        ReconciliationReport {
            accounts_checked: accounts.len(),
            discrepancies,
        }
    }

    /// Stock on hand valued at current cost.
    ///
    /// Levels for unknown parts and zero quantities are left out.
    #[must_use]
    pub fn stock_report(
        levels: &[StockLevel],
        parts: &HashMap<PartId, PartSnapshot>,
    ) -> StockReport {
        let mut rows: Vec<StockReportRow> = levels
            .iter()
            .filter(|level| level.quantity != 0)
            .filter_map(|level| {
                let part = parts.get(&level.part_id)?;
                Some(StockReportRow {
                    part_id: level.part_id,
                    part_no: part.part_no.clone(),
                    store_id: level.store_id,
                    quantity: level.quantity,
                    unit_cost: part.cost,
                    value: round_money(Decimal::from(level.quantity) * part.cost),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.part_no
                .cmp(&b.part_no)
                .then_with(|| a.store_id.cmp(&b.store_id))
        });

        StockReport {
            total_quantity: rows.iter().map(|r| r.quantity).sum(),
            total_value: rows.iter().map(|r| r.value).sum(),
            rows,
        }
    }

    fn check_range(from: NaiveDate, to: NaiveDate) -> Result<(), ReportError> {
        if from > to {
            return Err(ReportError::InvalidDateRange {
                start: from,
                end: to,
            });
        }
        Ok(())
    }

    fn sum_lines<'a>(lines: impl Iterator<Item = &'a PostedLine>) -> Totals {
        let mut totals = Totals::new();
        for line in lines {
            let entry = totals.entry(line.account_id).or_default();
            entry.0 += line.debit;
            entry.1 += line.credit;
        }
        totals
    }

    fn account_balances<'a>(
        accounts: &'a [ChartAccount],
        totals: &Totals,
        include_opening: bool,
    ) -> Vec<(&'a ChartAccount, AccountBalance)> {
        accounts
            .iter()
            .map(|account| {
                let (total_debit, total_credit) =
                    totals.get(&account.id).copied().unwrap_or_default();
                let opening = if include_opening {
                    account.opening_balance
                } else {
                    Decimal::ZERO
                };
                let balance = opening
                    + account
                        .account_type
                        .normal_balance()
                        .balance_change(total_debit, total_credit);
                (
                    account,
                    AccountBalance {
                        account_id: account.id,
                        code: account.code.clone(),
                        name: account.name.clone(),
                        account_type: account.account_type,
                        total_debit,
                        total_credit,
                        balance,
                    },
                )
            })
            .collect()
    }

    fn build_section(
        balances: &[(&ChartAccount, AccountBalance)],
        account_type: AccountType,
    ) -> StatementSection {
        type SubgroupKey = (String, SubgroupId);
        type GroupKey = (String, MainGroupId);

        let mut tree: BTreeMap<GroupKey, BTreeMap<SubgroupKey, Vec<AccountBalance>>> =
            BTreeMap::new();
        for (account, balance) in balances.iter().filter(|(a, _)| a.account_type == account_type) {
            tree.entry((account.main_group_name.clone(), account.main_group_id))
                .or_default()
                .entry((account.subgroup_name.clone(), account.subgroup_id))
                .or_default()
                .push(balance.clone());
        }

        let mut section = StatementSection::default();
        for ((group_name, group_id), subgroups) in tree {
            let mut group = MainGroupSection {
                id: group_id,
                name: group_name,
                total: Decimal::ZERO,
                subgroups: Vec::with_capacity(subgroups.len()),
            };
            for ((sub_name, sub_id), mut accounts) in subgroups {
                accounts.sort_by(|a, b| a.code.cmp(&b.code));
                let total = accounts.iter().map(|a| a.balance).sum();
                group.total += total;
                group.subgroups.push(SubgroupSection {
                    id: sub_id,
                    name: sub_name,
                    total,
                    accounts,
                });
            }
            section.total += group.total;
            section.groups.push(group);
        }
        section
    }
}

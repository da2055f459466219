//! Report tests over a small chart of accounts.

use std::collections::HashMap;

use chrono::NaiveDate;
use inventra_shared::types::{
    AccountId, LedgerEntryId, MainGroupId, PartId, StoreId, SubgroupId,
};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::error::ReportError;
use super::service::ReportService;
use super::types::{ChartAccount, PostedLine};
use crate::catalog::PartSnapshot;
use crate::ledger::{AccountType, EntryKind, recompute_balance};
use crate::stock::StockLevel;

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, d).unwrap()
}

struct Books {
    accounts: Vec<ChartAccount>,
    lines: Vec<PostedLine>,
    next_no: u32,
}

impl Books {
    /// Cash 1000, inventory 1300, payable 2100, capital 3000, sales 4100,
    /// COGS 5100, rent 6100. Opening: cash 5000 against capital 5000.
    fn new() -> Self {
        let group = |t: AccountType, sub: &str| (t, MainGroupId::new(), SubgroupId::new(), sub.to_string());
        let assets = group(AccountType::Asset, "Current assets");
        let liabilities = group(AccountType::Liability, "Current liabilities");
        let equity = group(AccountType::Equity, "Owner");
        let revenue = group(AccountType::Revenue, "Sales");
        let cost = group(AccountType::Cost, "Direct cost");
        let expense = group(AccountType::Expense, "Operating");

        let account = |code: &str, name: &str, g: &(AccountType, MainGroupId, SubgroupId, String), opening: Decimal| {
            ChartAccount {
                id: AccountId::new(),
                code: code.to_string(),
                name: name.to_string(),
                account_type: g.0,
                main_group_id: g.1,
                main_group_name: g.0.as_str().to_string(),
                subgroup_id: g.2,
                subgroup_name: g.3.clone(),
                opening_balance: opening,
                current_balance: opening,
            }
        };

        Self {
            accounts: vec![
                account("1000", "Cash", &assets, dec!(5000)),
                account("1300", "Inventory", &assets, dec!(0)),
                account("2100", "Payables", &liabilities, dec!(0)),
                account("3000", "Capital", &equity, dec!(5000)),
                account("4100", "Sales", &revenue, dec!(0)),
                account("5100", "COGS", &cost, dec!(0)),
                account("6100", "Rent", &expense, dec!(0)),
            ],
            lines: vec![],
            next_no: 1,
        }
    }

    fn id(&self, code: &str) -> AccountId {
        self.accounts.iter().find(|a| a.code == code).unwrap().id
    }

    fn account(&self, code: &str) -> &ChartAccount {
        self.accounts.iter().find(|a| a.code == code).unwrap()
    }

    /// Posts a two-line entry and keeps cached balances in step.
    fn post(&mut self, on: NaiveDate, debit: &str, credit: &str, amount: Decimal) {
        let entry_id = LedgerEntryId::new();
        let entry_no = format!("JE-{:06}", self.next_no);
        self.next_no += 1;

        for (code, d, c) in [(debit, amount, Decimal::ZERO), (credit, Decimal::ZERO, amount)] {
            let account_id = self.id(code);
            self.lines.push(PostedLine {
                entry_id,
                entry_no: entry_no.clone(),
                kind: EntryKind::Journal,
                entry_date: on,
                description: format!("{debit}/{credit}"),
                account_id,
                debit: d,
                credit: c,
            });
            if let Some(account) = self.accounts.iter_mut().find(|a| a.id == account_id) {
                account.current_balance += account.account_type.normal_balance().balance_change(d, c);
            }
        }
    }

    /// A month of trading: buy stock on credit, sell half, pay rent.
    fn trading_month() -> Self {
        let mut books = Self::new();
        books.post(date(1, 5), "1300", "2100", dec!(1200));
        books.post(date(1, 10), "1000", "4100", dec!(900));
        books.post(date(1, 10), "5100", "1300", dec!(600));
        books.post(date(1, 20), "6100", "1000", dec!(250));
        books.post(date(2, 3), "2100", "1000", dec!(1200));
        books
    }
}

#[test]
fn test_trial_balance_balances() {
    let books = Books::trading_month();
    let report = ReportService::trial_balance(date(1, 31), &books.accounts, &books.lines);

    assert!(report.totals.is_balanced);
    // cash 5000 + 900 - 250, inventory 600, COGS 600, rent 250
    assert_eq!(report.totals.total_debit, dec!(7100));

    let cash = report.rows.iter().find(|r| r.code == "1000").unwrap();
    assert_eq!(cash.debit, dec!(5650));
    assert_eq!(cash.credit, dec!(0));

    let payable = report.rows.iter().find(|r| r.code == "2100").unwrap();
    assert_eq!(payable.credit, dec!(1200));
}

#[test]
fn test_trial_balance_respects_as_of() {
    let books = Books::trading_month();
    let january = ReportService::trial_balance(date(1, 31), &books.accounts, &books.lines);
    let february = ReportService::trial_balance(date(2, 28), &books.accounts, &books.lines);

    let payable = |r: &super::TrialBalanceReport| {
        r.rows.iter().find(|row| row.code == "2100").unwrap().credit
    };
    assert_eq!(payable(&january), dec!(1200));
    assert_eq!(payable(&february), dec!(0));
}

#[test]
fn test_balance_sheet_folds_earnings_into_equity() {
    let books = Books::trading_month();
    let report = ReportService::balance_sheet(date(1, 31), &books.accounts, &books.lines);

    // 900 sales - 600 COGS - 250 rent
    assert_eq!(report.current_earnings, dec!(50));
    assert_eq!(report.assets.total, dec!(6250));
    assert_eq!(report.liabilities.total, dec!(1200));
    assert_eq!(report.total_equity, dec!(5050));
    assert!(report.is_balanced);

    let assets = &report.assets.groups[0];
    assert_eq!(assets.subgroups[0].name, "Current assets");
    let codes: Vec<&str> = assets.subgroups[0].accounts.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(codes, vec!["1000", "1300"]);
}

#[test]
fn test_income_statement() {
    let books = Books::trading_month();
    let report =
        ReportService::income_statement(date(1, 1), date(1, 31), &books.accounts, &books.lines)
            .unwrap();

    assert_eq!(report.revenue.total, dec!(900));
    assert_eq!(report.cost.total, dec!(600));
    assert_eq!(report.gross_profit, dec!(300));
    assert_eq!(report.expense.total, dec!(250));
    assert_eq!(report.net_income, dec!(50));
}

#[test]
fn test_income_statement_rejects_inverted_range() {
    let books = Books::new();
    assert_eq!(
        ReportService::income_statement(date(2, 1), date(1, 1), &books.accounts, &books.lines),
        Err(ReportError::InvalidDateRange {
            start: date(2, 1),
            end: date(1, 1),
        })
    );
}

#[test]
fn test_account_ledger_running_balance() {
    let books = Books::trading_month();
    let cash = books.account("1000");
    let report = ReportService::account_ledger(cash, date(1, 15), date(2, 28), &books.lines).unwrap();

    // 5000 opening + 900 sale before the window
    assert_eq!(report.opening_balance, dec!(5900));
    let running: Vec<Decimal> = report.rows.iter().map(|r| r.running_balance).collect();
    assert_eq!(running, vec![dec!(5650), dec!(4450)]);
    assert_eq!(report.closing_balance, dec!(4450));
    assert_eq!(report.total_credit, dec!(1450));
}

#[test]
fn test_reconcile_clean_and_drifted() {
    let mut books = Books::trading_month();
    assert!(ReportService::reconcile(&books.accounts, &books.lines).is_clean());

    // Simulate a reversal that deleted lines without undoing the balance.
    let inventory = books.id("1300");
    books.lines.retain(|l| l.entry_no != "JE-000001");

    let report = ReportService::reconcile(&books.accounts, &books.lines);
    assert_eq!(report.accounts_checked, 7);
    let codes: Vec<&str> = report.discrepancies.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(codes, vec!["1300", "2100"]);

    let drift = report
        .discrepancies
        .iter()
        .find(|d| d.account_id == inventory)
        .unwrap();
    assert_eq!(drift.cached, dec!(600));
    assert_eq!(drift.recomputed, dec!(-600));
    assert_eq!(drift.difference, dec!(1200));
}

#[test]
fn test_stock_report_values_at_current_cost() {
    let filter = PartId::new();
    let belt = PartId::new();
    let store = StoreId::new();
    let parts = HashMap::from([
        (filter, PartSnapshot { part_id: filter, part_no: "F-100".into(), cost: dec!(12.5), on_hand: 0 }),
        (belt, PartSnapshot { part_id: belt, part_no: "B-200".into(), cost: dec!(40), on_hand: 0 }),
    ]);
    let levels = vec![
        StockLevel { part_id: filter, store_id: Some(store), quantity: 3 },
        StockLevel { part_id: belt, store_id: None, quantity: 2 },
        StockLevel { part_id: belt, store_id: Some(store), quantity: 0 },
        StockLevel { part_id: PartId::new(), store_id: None, quantity: 9 },
    ];

    let report = ReportService::stock_report(&levels, &parts);
    let rows: Vec<(&str, i64, Decimal)> = report
        .rows
        .iter()
        .map(|r| (r.part_no.as_str(), r.quantity, r.value))
        .collect();
    assert_eq!(rows, vec![("B-200", 2, dec!(80)), ("F-100", 3, dec!(37.5))]);
    assert_eq!(report.total_quantity, 5);
    assert_eq!(report.total_value, dec!(117.5));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any set of balanced entries and any cut-off date, the trial
    /// balance and balance sheet both balance, and every recomputed account
    /// balance equals opening plus its signed lines.
    #[test]
    fn prop_statements_balance_at_any_date(
        entries in prop::collection::vec((0usize..7, 0usize..7, 1i64..1_000_000, 1u32..29), 0..30),
        cut_off in 1u32..29,
    ) {
        let mut books = Books::new();
        let codes: Vec<String> = books.accounts.iter().map(|a| a.code.clone()).collect();
        for (d, c, cents, day) in &entries {
            books.post(date(3, *day), &codes[*d], &codes[*c], Decimal::new(*cents, 2));
        }
        let as_of = date(3, cut_off);

        let trial = ReportService::trial_balance(as_of, &books.accounts, &books.lines);
        prop_assert!(trial.totals.is_balanced);

        let sheet = ReportService::balance_sheet(as_of, &books.accounts, &books.lines);
        prop_assert!(sheet.is_balanced);

        for account in &books.accounts {
            let expected = recompute_balance(
                account.account_type,
                account.opening_balance,
                books
                    .lines
                    .iter()
                    .filter(|l| l.account_id == account.id && l.entry_date <= as_of)
                    .map(|l| (l.debit, l.credit)),
            );
            let ledger = ReportService::account_ledger(account, date(3, 1), as_of, &books.lines).unwrap();
            prop_assert_eq!(ledger.closing_balance, expected);
        }

        prop_assert!(ReportService::reconcile(&books.accounts, &books.lines).is_clean());
    }
}

//! Ledger posting, reconciliation and orphan detection against a live database.

mod common;

use chrono::{NaiveDate, Utc};
use common::{Fixture, connect, date, fixture};
use inventra_core::ledger::{EntryInput, EntryKind, LedgerError, LineInput, VoucherType};
use inventra_core::reports::BalanceSheetReport;
use inventra_db::entities::{
    sea_orm_active_enums::{MovementDirection, ReferenceType},
    stock_movements,
};
use inventra_db::repositories::{
    AccountRepoError, AccountRepository, LedgerRepoError, LedgerRepository, ReportRepository,
    StockRepository,
};
use inventra_shared::types::{AccountId, LedgerEntryId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use uuid::Uuid;

async fn balance(db: &DatabaseConnection, account_id: AccountId) -> Decimal {
    AccountRepository::new(db.clone())
        .find_by_id(account_id)
        .await
        .unwrap()
        .unwrap()
        .current_balance
}

fn contribution(fixture: &Fixture, amount: Decimal) -> EntryInput {
    contribution_on(fixture, amount, date(2026, 5, 4))
}

fn contribution_on(fixture: &Fixture, amount: Decimal, entry_date: NaiveDate) -> EntryInput {
    EntryInput {
        kind: EntryKind::Journal,
        voucher_type: None,
        entry_date,
        description: "Owner contribution".to_string(),
        reference: None,
        lines: vec![
            LineInput::debit(fixture.cash, amount),
            LineInput::credit(fixture.equity, amount),
        ],
    }
}

#[tokio::test]
async fn test_draft_posts_exactly_once() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let ledger = LedgerRepository::new(db.clone());

    let draft = ledger.create_draft(&contribution(&fixture, dec!(300))).await.unwrap();
    assert_eq!(balance(&db, fixture.cash).await, Decimal::ZERO);

    let id = LedgerEntryId::from_uuid(draft.id);
    ledger.post_draft(id).await.unwrap();
    assert_eq!(balance(&db, fixture.cash).await, dec!(300));

    let again = ledger.post_draft(id).await;
    assert!(matches!(
        again,
        Err(LedgerRepoError::Ledger(LedgerError::AlreadyPosted(_)))
    ));
    assert_eq!(balance(&db, fixture.cash).await, dec!(300));
    assert_eq!(balance(&db, fixture.equity).await, dec!(300));
}

#[tokio::test]
async fn test_unbalanced_entry_is_rejected() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let ledger = LedgerRepository::new(db.clone());

    let mut input = contribution(&fixture, dec!(100));
    input.lines[1].credit = dec!(90);

    let result = ledger.post_entry(&input).await;
    assert!(matches!(
        result,
        Err(LedgerRepoError::Ledger(LedgerError::Unbalanced { .. }))
    ));
    assert_eq!(balance(&db, fixture.cash).await, Decimal::ZERO);
}

#[tokio::test]
async fn test_sub_cent_lines_are_rejected_before_storage() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let ledger = LedgerRepository::new(db.clone());

    let input = EntryInput {
        lines: vec![
            LineInput::debit(fixture.cash, dec!(0.005)),
            LineInput::debit(fixture.cash, dec!(0.005)),
            LineInput::credit(fixture.equity, dec!(0.01)),
        ],
        description: format!("Sub-cent {}", fixture.tag),
        ..contribution(&fixture, dec!(1))
    };
    let result = ledger.post_entry(&input).await;
    assert!(matches!(
        result,
        Err(LedgerRepoError::Ledger(LedgerError::ExcessPrecision(_)))
    ));
    assert_eq!(balance(&db, fixture.cash).await, Decimal::ZERO);
    assert_eq!(balance(&db, fixture.equity).await, Decimal::ZERO);

    let draft = ledger.create_draft(&input).await;
    assert!(matches!(
        draft,
        Err(LedgerRepoError::Ledger(LedgerError::ExcessPrecision(_)))
    ));
    let stored = ledger
        .list_entries(date(2026, 5, 4), date(2026, 5, 4))
        .await
        .unwrap();
    assert!(stored.iter().all(|e| e.description != input.description));
}

#[tokio::test]
async fn test_voucher_numbers_use_voucher_prefix() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let ledger = LedgerRepository::new(db.clone());

    let mut input = contribution(&fixture, dec!(20));
    input.kind = EntryKind::Voucher;
    input.voucher_type = Some(VoucherType::Receipt);

    let entry = ledger.post_entry(&input).await.unwrap();
    assert!(entry.entry_no.starts_with("RV-"));

    let loaded = ledger
        .get_entry(LedgerEntryId::from_uuid(entry.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.lines.len(), 2);
    assert_eq!(loaded.total_debit(), loaded.total_credit());
}

#[tokio::test]
async fn test_reversing_entry_restores_balances() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let ledger = LedgerRepository::new(db.clone());

    let entry = ledger.post_entry(&contribution(&fixture, dec!(75.50))).await.unwrap();
    assert_eq!(balance(&db, fixture.cash).await, dec!(75.50));

    ledger
        .reverse_entry(LedgerEntryId::from_uuid(entry.id))
        .await
        .unwrap();
    assert_eq!(balance(&db, fixture.cash).await, Decimal::ZERO);
    assert_eq!(balance(&db, fixture.equity).await, Decimal::ZERO);
    assert!(
        ledger
            .get_entry(LedgerEntryId::from_uuid(entry.id))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_account_with_lines_cannot_be_deleted() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    LedgerRepository::new(db.clone())
        .post_entry(&contribution(&fixture, dec!(10)))
        .await
        .unwrap();

    let result = AccountRepository::new(db.clone()).delete_account(fixture.cash).await;
    assert!(matches!(
        result,
        Err(AccountRepoError::Ledger(LedgerError::AccountInUse { .. }))
    ));
}

#[tokio::test]
async fn test_reports_agree_with_cached_balances() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    ledger.post_entry(&contribution(&fixture, dec!(500))).await.unwrap();
    ledger.post_entry(&contribution(&fixture, dec!(250))).await.unwrap();

    let reports = ReportRepository::new(db.clone());

    let trial = reports.trial_balance(date(2026, 12, 31)).await.unwrap();
    assert!(trial.totals.is_balanced);
    let cash_row = trial
        .rows
        .iter()
        .find(|r| r.account_id == fixture.cash)
        .expect("cash row");
    assert_eq!(cash_row.debit, dec!(750));

    let statement = reports
        .account_ledger(fixture.cash, date(2026, 1, 1), date(2026, 12, 31))
        .await
        .unwrap();
    assert_eq!(statement.rows.len(), 2);
    assert_eq!(statement.rows[1].running_balance, dec!(750));

    let reconciliation = reports.reconcile().await.unwrap();
    assert!(
        reconciliation
            .discrepancies
            .iter()
            .all(|d| d.account_id != fixture.cash && d.account_id != fixture.equity)
    );
}

fn sheet_balance(sheet: &BalanceSheetReport, account_id: AccountId) -> Option<Decimal> {
    sheet
        .assets
        .groups
        .iter()
        .flat_map(|g| &g.subgroups)
        .flat_map(|s| &s.accounts)
        .find(|a| a.account_id == account_id)
        .map(|a| a.balance)
}

#[tokio::test]
async fn test_reports_split_at_date_boundaries() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let ledger = LedgerRepository::new(db.clone());
    for (amount, day) in [
        (dec!(500), date(2026, 5, 4)),
        (dec!(120), date(2026, 6, 30)),
        (dec!(80), date(2026, 7, 1)),
    ] {
        ledger.post_entry(&contribution_on(&fixture, amount, day)).await.unwrap();
    }
    let reports = ReportRepository::new(db.clone());

    // Entries dated on the as-of day are included, the next day's are not.
    let sheet = reports.balance_sheet(date(2026, 6, 30)).await.unwrap();
    assert!(sheet.is_balanced);
    assert_eq!(sheet_balance(&sheet, fixture.cash), Some(dec!(620)));
    let trial = reports.trial_balance(date(2026, 6, 30)).await.unwrap();
    assert!(trial.totals.is_balanced);
    let cash_row = trial.rows.iter().find(|r| r.account_id == fixture.cash).expect("cash row");
    assert_eq!(cash_row.debit, dec!(620));

    let sheet = reports.balance_sheet(date(2026, 7, 1)).await.unwrap();
    assert!(sheet.is_balanced);
    assert_eq!(sheet_balance(&sheet, fixture.cash), Some(dec!(700)));

    let boundary_day = reports
        .account_ledger(fixture.cash, date(2026, 6, 30), date(2026, 6, 30))
        .await
        .unwrap();
    assert_eq!(boundary_day.opening_balance, dec!(500));
    assert_eq!(boundary_day.rows.len(), 1);
    assert_eq!(boundary_day.closing_balance, dec!(620));

    // The last period closes on the cached balance.
    let after = reports
        .account_ledger(fixture.cash, date(2026, 7, 1), date(2026, 12, 31))
        .await
        .unwrap();
    assert_eq!(after.opening_balance, dec!(620));
    assert_eq!(after.closing_balance, balance(&db, fixture.cash).await);

    let reconciliation = reports.reconcile().await.unwrap();
    assert!(reconciliation.discrepancies.iter().all(|d| d.account_id != fixture.cash));
}

#[tokio::test]
async fn test_orphaned_movement_is_found_and_removed() {
    let Some(db) = connect().await else { return };
    let fixture = fixture(&db).await;
    let part_id = fixture.part(&db, "OR", dec!(1.00)).await.unwrap();

    let orphan = stock_movements::ActiveModel {
        id: Set(Uuid::now_v7()),
        part_id: Set(part_id.into_inner()),
        store_id: Set(None),
        direction: Set(MovementDirection::In),
        quantity: Set(2),
        reference_type: Set(ReferenceType::Adjustment),
        reference_id: Set(Uuid::new_v4()),
        unit_cost: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&db)
    .await
    .unwrap();

    let stock = StockRepository::new(db.clone());
    let found = stock.find_orphans().await.unwrap();
    assert!(found.iter().any(|m| m.id == orphan.id));

    let removed = stock.delete_orphans().await.unwrap();
    assert!(removed >= 1);
    let found = stock.find_orphans().await.unwrap();
    assert!(found.iter().all(|m| m.id != orphan.id));
    assert_eq!(stock.on_hand(part_id).await.unwrap(), 0);
}

//! Report repository: loads the chart and posted lines, then delegates to
//! [`ReportService`].

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use inventra_core::catalog::PartSnapshot;
use inventra_core::reports::{
    AccountLedgerReport, BalanceSheetReport, ChartAccount, IncomeStatementReport, PostedLine,
    ReconciliationReport, ReportError, ReportService, StockReport, TrialBalanceReport,
};
use inventra_core::stock::{on_hand_by_part, stock_levels};
use inventra_shared::AppError;
use inventra_shared::types::{AccountId, LedgerEntryId, PartId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    AccessMode, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IsolationLevel, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};

use super::account::load_chart;
use super::stock::load_movements;
use crate::entities::{
    accounts, ledger_entries, ledger_lines, parts,
    sea_orm_active_enums::EntryStatus as DbEntryStatus,
};

/// Error types for report operations.
#[derive(Debug, thiserror::Error)]
pub enum ReportRepoError {
    /// Report rule violated.
    #[error(transparent)]
    Report(#[from] ReportError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ReportRepoError> for AppError {
    fn from(err: ReportRepoError) -> Self {
        match err {
            ReportRepoError::Report(e) => e.into(),
            ReportRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Trial balance as of a date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn trial_balance(&self, as_of: NaiveDate) -> Result<TrialBalanceReport, ReportRepoError> {
        let (chart, lines) = self.load(Some(as_of)).await?;
        Ok(ReportService::trial_balance(as_of, &chart, &lines))
    }

    /// Balance sheet as of a date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance_sheet(&self, as_of: NaiveDate) -> Result<BalanceSheetReport, ReportRepoError> {
        let (chart, lines) = self.load(Some(as_of)).await?;
        Ok(ReportService::balance_sheet(as_of, &chart, &lines))
    }

    /// Income statement for `[from, to]`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidDateRange`] when `from > to`.
    pub async fn income_statement(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<IncomeStatementReport, ReportRepoError> {
        let (chart, lines) = self.load(Some(to)).await?;
        Ok(ReportService::income_statement(from, to, &chart, &lines)?)
    }

    /// Ledger of one account for `[from, to]` with running balance.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::AccountNotFound`] for an unknown account.
    pub async fn account_ledger(
        &self,
        account_id: AccountId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<AccountLedgerReport, ReportRepoError> {
        let (chart, lines) = self.load(Some(to)).await?;
        let account = chart
            .iter()
            .find(|a| a.id == account_id)
            .ok_or(ReportError::AccountNotFound(account_id))?;
        Ok(ReportService::account_ledger(account, from, to, &lines)?)
    }

    /// Compares every cached balance with its opening balance plus posted lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reconcile(&self) -> Result<ReconciliationReport, ReportRepoError> {
        let (chart, lines) = self.load(None).await?;
        Ok(ReportService::reconcile(&chart, &lines))
    }

    /// Rewrites drifted cached balances with their recomputed value.
    ///
    /// Account rows are locked first, so postings wait until the repair
    /// commits. Returns the drift found before repairing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn repair_balances(&self) -> Result<ReconciliationReport, ReportRepoError> {
        let txn = self.db.begin().await?;

        accounts::Entity::find()
            .order_by_asc(accounts::Column::Id)
            .lock_exclusive()
            .all(&txn)
            .await?;
        let chart = load_chart(&txn).await?;
        let lines = load_posted_lines(&txn, None).await?;
        let report = ReportService::reconcile(&chart, &lines);

        let now = Utc::now();
        for discrepancy in &report.discrepancies {
            accounts::Entity::update_many()
                .col_expr(accounts::Column::CurrentBalance, Expr::value(discrepancy.recomputed))
                .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
                .filter(accounts::Column::Id.eq(discrepancy.account_id.into_inner()))
                .exec(&txn)
                .await?;
            tracing::warn!(
                code = %discrepancy.code,
                cached = %discrepancy.cached,
                recomputed = %discrepancy.recomputed,
                "Account balance repaired"
            );
        }

        txn.commit().await?;
        Ok(report)
    }

    /// Stock on hand per part and store, valued at current cost.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn stock_report(&self) -> Result<StockReport, ReportRepoError> {
        let movements = load_movements(&self.db, None).await?;
        let on_hand = on_hand_by_part(&movements);
        let snapshots: HashMap<PartId, PartSnapshot> = parts::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|part| {
                let part_id = PartId::from_uuid(part.id);
                let snapshot = PartSnapshot {
                    part_id,
                    part_no: part.part_no,
                    cost: part.cost,
                    on_hand: on_hand.get(&part_id).copied().unwrap_or(0),
                };
                (part_id, snapshot)
            })
            .collect();
        Ok(ReportService::stock_report(&stock_levels(&movements), &snapshots))
    }

    /// Reads the chart and the posted lines from one snapshot, so cached
    /// balances and lines agree even while postings commit.
    async fn load(
        &self,
        up_to: Option<NaiveDate>,
    ) -> Result<(Vec<ChartAccount>, Vec<PostedLine>), ReportRepoError> {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await?;
        let chart = load_chart(&txn).await?;
        let lines = load_posted_lines(&txn, up_to).await?;
        txn.commit().await?;
        Ok((chart, lines))
    }
}

/// Lines of posted entries, optionally only those dated on or before `up_to`.
async fn load_posted_lines<C: ConnectionTrait>(
    conn: &C,
    up_to: Option<NaiveDate>,
) -> Result<Vec<PostedLine>, DbErr> {
    let mut query = ledger_lines::Entity::find()
        .find_also_related(ledger_entries::Entity)
        .filter(ledger_entries::Column::Status.eq(DbEntryStatus::Posted));
    if let Some(date) = up_to {
        query = query.filter(ledger_entries::Column::EntryDate.lte(date));
    }
    let rows = query
        .order_by_asc(ledger_entries::Column::EntryDate)
        .order_by_asc(ledger_entries::Column::EntryNo)
        .order_by_asc(ledger_lines::Column::LineNo)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(line, entry)| {
            let entry = entry?;
            Some(PostedLine {
                entry_id: LedgerEntryId::from_uuid(entry.id),
                entry_no: entry.entry_no,
                kind: entry.kind.into(),
                entry_date: entry.entry_date,
                description: entry.description,
                account_id: AccountId::from_uuid(line.account_id),
                debit: line.debit,
                credit: line.credit,
            })
        })
        .collect())
}

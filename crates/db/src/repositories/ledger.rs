//! Ledger repository: numbering, posting and reversing entries.
//!
//! Balance changes are applied as `current_balance = current_balance + delta`
//! so concurrent postings to the same account never lose an update.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use inventra_core::ledger::{
    AccountInfo, BalanceDelta, EntryInput, EntryKind, EntryStatus, LedgerError, LedgerService,
    LineInput, format_entry_no, posting_deltas, reversal_deltas,
};
use inventra_core::stock::DocumentRef;
use inventra_shared::AppError;
use inventra_shared::types::{AccountId, LedgerEntryId, LedgerLineId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use serde::Serialize;

use super::account::load_account_infos;
use crate::entities::{
    accounts, ledger_entries, ledger_lines,
    sea_orm_active_enums::EntryStatus as DbEntryStatus,
};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerRepoError {
    /// Ledger rule violated.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<LedgerRepoError> for AppError {
    fn from(err: LedgerRepoError) -> Self {
        match err {
            LedgerRepoError::Ledger(e) => e.into(),
            LedgerRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// An entry header with its lines in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryWithLines {
    pub entry: ledger_entries::Model,
    pub lines: Vec<ledger_lines::Model>,
}

impl EntryWithLines {
    /// Sum of debit lines.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    /// Sum of credit lines.
    #[must_use]
    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Saves an entry as a draft. Drafts do not touch balances.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry is invalid, an account is unknown, or
    /// the insert fails.
    pub async fn create_draft(
        &self,
        input: &EntryInput,
    ) -> Result<ledger_entries::Model, LedgerRepoError> {
        let txn = self.db.begin().await?;

        let accounts = accounts_for(&txn, &input.lines).await?;
        LedgerService::validate_draft(input, |id| lookup(&accounts, id))?;
        let entry = insert_entry(&txn, input, EntryStatus::Draft).await?;

        txn.commit().await?;
        tracing::info!(entry_id = %entry.id, entry_no = %entry.entry_no, "Draft entry created");
        Ok(entry)
    }

    /// Creates and posts an entry in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or an account is inactive.
    pub async fn post_entry(
        &self,
        input: &EntryInput,
    ) -> Result<ledger_entries::Model, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let entry = post_in(&txn, input).await?;
        txn.commit().await?;
        Ok(entry)
    }

    /// Posts a draft entry.
    ///
    /// The status change is a compare-and-set on `draft`, so two callers
    /// posting the same draft apply its balances once.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::EntryNotFound`] for an unknown entry.
    /// - [`LedgerError::AlreadyPosted`] when it was already posted.
    pub async fn post_draft(
        &self,
        entry_id: LedgerEntryId,
    ) -> Result<ledger_entries::Model, LedgerRepoError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let claimed = ledger_entries::Entity::update_many()
            .col_expr(ledger_entries::Column::Status, DbEntryStatus::Posted.as_enum())
            .col_expr(ledger_entries::Column::PostedAt, Expr::value(now))
            .filter(ledger_entries::Column::Id.eq(entry_id.into_inner()))
            .filter(ledger_entries::Column::Status.eq(DbEntryStatus::Draft))
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            let exists = ledger_entries::Entity::find_by_id(entry_id.into_inner())
                .one(&txn)
                .await?;
            return Err(match exists {
                Some(_) => LedgerError::AlreadyPosted(entry_id),
                None => LedgerError::EntryNotFound(entry_id),
            }
            .into());
        }

        let loaded = load_entry(&txn, entry_id)
            .await?
            .ok_or(LedgerError::EntryNotFound(entry_id))?;
        let input = loaded.to_input();
        let accounts = accounts_for(&txn, &input.lines).await?;
        let prepared = LedgerService::prepare_posting(&input, |id| lookup(&accounts, id))?;
        apply_deltas(&txn, &prepared.deltas).await?;

        txn.commit().await?;
        tracing::info!(entry_id = %entry_id, entry_no = %loaded.entry.entry_no, "Draft entry posted");
        Ok(loaded.entry)
    }

    /// Reverses a posted entry's balance effect and deletes it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EntryNotFound`] for an unknown entry.
    pub async fn reverse_entry(&self, entry_id: LedgerEntryId) -> Result<(), LedgerRepoError> {
        let txn = self.db.begin().await?;
        reverse_in(&txn, entry_id).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Loads an entry with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_entry(
        &self,
        entry_id: LedgerEntryId,
    ) -> Result<Option<EntryWithLines>, LedgerRepoError> {
        Ok(load_entry(&self.db, entry_id).await?)
    }

    /// Lists entries dated within `[from, to]`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_entries(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ledger_entries::Model>, LedgerRepoError> {
        Ok(ledger_entries::Entity::find()
            .filter(ledger_entries::Column::EntryDate.between(from, to))
            .order_by_asc(ledger_entries::Column::EntryDate)
            .order_by_asc(ledger_entries::Column::EntryNo)
            .all(&self.db)
            .await?)
    }
}

impl EntryWithLines {
    fn to_input(&self) -> EntryInput {
        EntryInput {
            kind: self.entry.kind.into(),
            voucher_type: self.entry.voucher_type.map(Into::into),
            entry_date: self.entry.entry_date,
            description: self.entry.description.clone(),
            reference: self
                .entry
                .reference_type
                .zip(self.entry.reference_id)
                .map(|(reference_type, id)| DocumentRef::new(reference_type.into(), id)),
            lines: self.lines.iter().map(to_line_input).collect(),
        }
    }
}

fn to_line_input(line: &ledger_lines::Model) -> LineInput {
    LineInput {
        account_id: AccountId::from_uuid(line.account_id),
        debit: line.debit,
        credit: line.credit,
        memo: line.memo.clone(),
    }
}

fn lookup(
    accounts: &HashMap<AccountId, AccountInfo>,
    id: AccountId,
) -> Result<AccountInfo, LedgerError> {
    accounts
        .get(&id)
        .cloned()
        .ok_or(LedgerError::AccountNotFound(id))
}

async fn accounts_for<C: ConnectionTrait>(
    conn: &C,
    lines: &[LineInput],
) -> Result<HashMap<AccountId, AccountInfo>, DbErr> {
    let mut ids: Vec<AccountId> = lines.iter().map(|l| l.account_id).collect();
    ids.sort_unstable();
    ids.dedup();
    load_account_infos(conn, &ids).await
}

/// Takes the next value of a named counter.
///
/// The upsert holds the row lock until the surrounding transaction ends, so
/// numbers are unique and gapless among committed transactions.
pub(crate) async fn next_sequence<C: ConnectionTrait>(conn: &C, prefix: &str) -> Result<u64, DbErr> {
    let row = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r"INSERT INTO number_sequences (prefix, last_value) VALUES ($1, 1)
              ON CONFLICT (prefix) DO UPDATE SET last_value = number_sequences.last_value + 1
              RETURNING last_value",
            [prefix.into()],
        ))
        .await?
        .ok_or_else(|| DbErr::Custom(format!("sequence {prefix} returned no row")))?;

    let value: i64 = row.try_get("", "last_value")?;
    u64::try_from(value).map_err(|_| DbErr::Custom(format!("sequence {prefix} is negative")))
}

/// Formatted next number for `prefix`, e.g. `PO-000012`.
pub(crate) async fn next_number<C: ConnectionTrait>(conn: &C, prefix: &str) -> Result<String, DbErr> {
    Ok(format_entry_no(prefix, next_sequence(conn, prefix).await?))
}

async fn insert_entry<C: ConnectionTrait>(
    conn: &C,
    input: &EntryInput,
    status: EntryStatus,
) -> Result<ledger_entries::Model, DbErr> {
    let entry_no = next_number(conn, input.number_prefix()).await?;
    let now = Utc::now().into();
    let entry_id = LedgerEntryId::new().into_inner();

    let entry = ledger_entries::ActiveModel {
        id: Set(entry_id),
        kind: Set(input.kind.into()),
        voucher_type: Set(input.voucher_type.map(Into::into)),
        entry_no: Set(entry_no),
        entry_date: Set(input.entry_date),
        description: Set(input.description.clone()),
        status: Set(status.into()),
        reference_type: Set(input.reference.map(|r| r.reference_type.into())),
        reference_id: Set(input.reference.map(|r| r.id)),
        posted_at: Set((status == EntryStatus::Posted).then_some(now)),
        created_at: Set(now),
    };
    let entry = entry.insert(conn).await?;

    let lines: Vec<ledger_lines::ActiveModel> = input
        .lines
        .iter()
        .zip(1..)
        .map(|(line, line_no)| ledger_lines::ActiveModel {
            id: Set(LedgerLineId::new().into_inner()),
            entry_id: Set(entry_id),
            account_id: Set(line.account_id.into_inner()),
            line_no: Set(line_no),
            debit: Set(line.debit),
            credit: Set(line.credit),
            memo: Set(line.memo.clone()),
        })
        .collect();
    ledger_lines::Entity::insert_many(lines).exec(conn).await?;

    Ok(entry)
}

/// Applies increments in account id order so concurrent postings lock rows
/// in the same sequence.
async fn apply_deltas<C: ConnectionTrait>(conn: &C, deltas: &[BalanceDelta]) -> Result<(), DbErr> {
    let mut ordered = deltas.to_vec();
    ordered.sort_by_key(|d| d.account_id);
    let now = Utc::now();
    for delta in &ordered {
        accounts::Entity::update_many()
            .col_expr(
                accounts::Column::CurrentBalance,
                Expr::col(accounts::Column::CurrentBalance).add(delta.delta),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(now))
            .filter(accounts::Column::Id.eq(delta.account_id.into_inner()))
            .exec(conn)
            .await?;
    }
    Ok(())
}

async fn load_entry<C: ConnectionTrait>(
    conn: &C,
    entry_id: LedgerEntryId,
) -> Result<Option<EntryWithLines>, DbErr> {
    let Some(entry) = ledger_entries::Entity::find_by_id(entry_id.into_inner())
        .one(conn)
        .await?
    else {
        return Ok(None);
    };

    let lines = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::EntryId.eq(entry.id))
        .order_by_asc(ledger_lines::Column::LineNo)
        .all(conn)
        .await?;

    Ok(Some(EntryWithLines { entry, lines }))
}

/// Validates, numbers, inserts and applies a posted entry on `conn`.
pub(crate) async fn post_in<C: ConnectionTrait>(
    conn: &C,
    input: &EntryInput,
) -> Result<ledger_entries::Model, LedgerRepoError> {
    let accounts = accounts_for(conn, &input.lines).await?;
    let prepared = LedgerService::prepare_posting(input, |id| lookup(&accounts, id))?;

    let entry = insert_entry(conn, input, EntryStatus::Posted).await?;
    apply_deltas(conn, &prepared.deltas).await?;

    tracing::info!(
        entry_id = %entry.id,
        entry_no = %entry.entry_no,
        debit = %prepared.totals.debit,
        voucher = input.kind == EntryKind::Voucher,
        "Entry posted"
    );
    Ok(entry)
}

/// Undoes a posted entry's balance effect and deletes it on `conn`.
///
/// The entry row is locked and deleted before balances move. Only the caller
/// whose delete removed the row applies the reversal, so a concurrent second
/// reversal fails with [`LedgerError::EntryNotFound`].
///
/// Draft entries are deleted without touching balances.
pub(crate) async fn reverse_in<C: ConnectionTrait>(
    conn: &C,
    entry_id: LedgerEntryId,
) -> Result<(), LedgerRepoError> {
    let entry = ledger_entries::Entity::find_by_id(entry_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(LedgerError::EntryNotFound(entry_id))?;
    let lines: Vec<LineInput> = ledger_lines::Entity::find()
        .filter(ledger_lines::Column::EntryId.eq(entry.id))
        .order_by_asc(ledger_lines::Column::LineNo)
        .all(conn)
        .await?
        .iter()
        .map(to_line_input)
        .collect();

    let removed = ledger_entries::Entity::delete_by_id(entry.id).exec(conn).await?;
    if removed.rows_affected != 1 {
        return Err(LedgerError::EntryNotFound(entry_id).into());
    }

    if entry.status == DbEntryStatus::Posted {
        let accounts = accounts_for(conn, &lines).await?;
        let deltas = posting_deltas(&lines, |id| lookup(&accounts, id))?;
        apply_deltas(conn, &reversal_deltas(&deltas)).await?;
    }

    tracing::info!(entry_id = %entry_id, entry_no = %entry.entry_no, "Entry reversed");
    Ok(())
}

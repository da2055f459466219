//! Sales invoice repository.
//!
//! Draft invoices may reserve stock. Posting releases the reservation,
//! issues the stock and posts revenue and cost of sales in one voucher.

use chrono::{NaiveDate, Utc};
use inventra_core::documents::{
    DeletionEffect, DocumentError, DocumentWorkflow, InvoiceItem, InvoiceStatus, SaleLineCost,
    SalesDocument, plan_reservation, plan_sale, validate_invoice_items,
};
use inventra_core::stock::StockMovement;
use inventra_shared::AppError;
use inventra_shared::config::PostingConfig;
use inventra_shared::types::{LedgerEntryId, PartId, SalesInvoiceId, StoreId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use super::account::{AccountRepoError, resolve_posting_accounts};
use super::ledger::{LedgerRepoError, next_number, post_in, reverse_in};
use super::stock::{delete_movements, insert_movements, part_snapshots};
use crate::entities::{
    sales_invoice_items, sales_invoices, sea_orm_active_enums::InvoiceStatus as DbInvoiceStatus,
};

const INVOICE_PREFIX: &str = "SI";

/// Error types for sales invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceRepoError {
    /// Sales invoice not found.
    #[error("Sales invoice not found: {0}")]
    NotFound(SalesInvoiceId),

    /// Lifecycle, stock or costing rule violated.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Posting accounts could not be resolved.
    #[error(transparent)]
    Account(#[from] AccountRepoError),

    /// The sale entry was rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerRepoError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<InvoiceRepoError> for AppError {
    fn from(err: InvoiceRepoError) -> Self {
        match err {
            InvoiceRepoError::NotFound(_) => Self::NotFound(err.to_string()),
            InvoiceRepoError::Document(e) => e.into(),
            InvoiceRepoError::Account(e) => e.into(),
            InvoiceRepoError::Ledger(e) => e.into(),
            InvoiceRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a sales invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    pub customer_name: String,
    pub invoice_date: NaiveDate,
    pub items: Vec<InvoiceItem>,
    /// Hold the stock while the invoice is a draft.
    pub reserve: bool,
}

/// A sales invoice with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceDetail {
    pub invoice: sales_invoices::Model,
    pub items: Vec<sales_invoice_items::Model>,
}

/// What posting a sales invoice wrote.
#[derive(Debug, Clone, Serialize)]
pub struct SaleOutcome {
    pub invoice: sales_invoices::Model,
    pub movements: Vec<StockMovement>,
    pub entry_id: Option<LedgerEntryId>,
    pub lines: Vec<SaleLineCost>,
    pub revenue_total: Decimal,
    pub cogs_total: Decimal,
}

/// Sales invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    posting: PostingConfig,
}

impl InvoiceRepository {
    /// Creates a new sales invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, posting: PostingConfig) -> Self {
        Self { db, posting }
    }

    /// Creates a draft invoice, optionally reserving its stock.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Validation`] for a bad quantity or price.
    /// - [`DocumentError::NoItems`] when reserving an empty invoice.
    /// - [`DocumentError::Stock`] when there is not enough free stock to reserve.
    pub async fn create(&self, input: CreateInvoiceInput) -> Result<InvoiceDetail, InvoiceRepoError> {
        validate_invoice_items(&input.items)?;
        let txn = self.db.begin().await?;

        let number = next_number(&txn, INVOICE_PREFIX).await?;
        let now = Utc::now().into();
        let invoice = sales_invoices::ActiveModel {
            id: Set(SalesInvoiceId::new().into_inner()),
            number: Set(number),
            customer_name: Set(input.customer_name),
            status: Set(DbInvoiceStatus::Draft),
            invoice_date: Set(input.invoice_date),
            posted_at: Set(None),
            ledger_entry_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut items = Vec::with_capacity(input.items.len());
        for (item, line_no) in input.items.iter().zip(1..) {
            let row = sales_invoice_items::ActiveModel {
                id: Set(Uuid::now_v7()),
                sales_invoice_id: Set(invoice.id),
                line_no: Set(line_no),
                part_id: Set(item.part_id.into_inner()),
                store_id: Set(item.store_id.map(StoreId::into_inner)),
                quantity: Set(item.quantity),
                unit_price: Set(item.unit_price),
                unit_cost: Set(None),
            }
            .insert(&txn)
            .await?;
            items.push(row);
        }

        if input.reserve {
            let document = to_document(&invoice, &items);
            // Locking the parts serialises competing reservations.
            let (_, on_hand) = part_snapshots(&txn, &part_ids(&document), None).await?;
            let movements = plan_reservation(&document, &on_hand)?;
            insert_movements(&txn, &movements).await?;
            tracing::info!(invoice_id = %invoice.id, lines = movements.len(), "Stock reserved");
        }

        txn.commit().await?;
        tracing::info!(invoice_id = %invoice.id, number = %invoice.number, "Sales invoice created");
        Ok(InvoiceDetail { invoice, items })
    }

    /// Loads an invoice with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: SalesInvoiceId) -> Result<Option<InvoiceDetail>, InvoiceRepoError> {
        Ok(load_detail(&self.db, id).await?)
    }

    /// Posts a draft invoice.
    ///
    /// Releases the invoice's reservation, issues stock at the current part
    /// cost and posts one voucher for revenue and cost of sales. The status
    /// change is a compare-and-set on `draft`.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::AlreadyProcessed`] when already posted.
    /// - [`DocumentError::Stock`] when stock would go below zero.
    pub async fn post(
        &self,
        id: SalesInvoiceId,
        posted_on: NaiveDate,
    ) -> Result<SaleOutcome, InvoiceRepoError> {
        let txn = self.db.begin().await?;

        let invoice = sales_invoices::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .ok_or(InvoiceRepoError::NotFound(id))?;
        DocumentWorkflow::post_invoice(invoice.status.into())?;

        let now = Utc::now();
        let claimed = sales_invoices::Entity::update_many()
            .col_expr(sales_invoices::Column::Status, DbInvoiceStatus::Posted.as_enum())
            .col_expr(sales_invoices::Column::PostedAt, Expr::value(now))
            .col_expr(sales_invoices::Column::UpdatedAt, Expr::value(now))
            .filter(sales_invoices::Column::Id.eq(invoice.id))
            .filter(sales_invoices::Column::Status.eq(DbInvoiceStatus::Draft))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            let current = sales_invoices::Entity::find_by_id(invoice.id)
                .one(&txn)
                .await?
                .ok_or(InvoiceRepoError::NotFound(id))?
                .status;
            return Err(DocumentError::AlreadyProcessed {
                document: "sales invoice",
                status: InvoiceStatus::from(current).to_string(),
            }
            .into());
        }

        let detail = load_detail(&txn, id).await?.ok_or(InvoiceRepoError::NotFound(id))?;
        let document = to_document(&detail.invoice, &detail.items);
        let accounts = resolve_posting_accounts(&txn, &self.posting).await?;
        let (snapshots, on_hand) =
            part_snapshots(&txn, &part_ids(&document), Some(document.reservation_reference())).await?;

        let plan = plan_sale(&document, &snapshots, &on_hand, &accounts, posted_on)?;

        delete_movements(&txn, document.reservation_reference()).await?;
        insert_movements(&txn, &plan.movements).await?;
        for (item, line) in detail.items.iter().zip(&plan.lines) {
            sales_invoice_items::Entity::update_many()
                .col_expr(sales_invoice_items::Column::UnitCost, Expr::value(line.unit_cost))
                .filter(sales_invoice_items::Column::Id.eq(item.id))
                .exec(&txn)
                .await?;
        }

        let entry_id = match &plan.posting {
            Some(entry) => Some(LedgerEntryId::from_uuid(post_in(&txn, entry).await?.id)),
            None => None,
        };

        let mut active: sales_invoices::ActiveModel = detail.invoice.into();
        active.status = Set(DbInvoiceStatus::Posted);
        active.ledger_entry_id = Set(entry_id.map(LedgerEntryId::into_inner));
        let invoice = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            invoice_id = %invoice.id,
            number = %invoice.number,
            revenue = %plan.revenue_total,
            cogs = %plan.cogs_total,
            "Sales invoice posted"
        );
        Ok(SaleOutcome {
            invoice,
            movements: plan.movements,
            entry_id,
            lines: plan.lines,
            revenue_total: plan.revenue_total,
            cogs_total: plan.cogs_total,
        })
    }

    /// Cancels a draft invoice and releases its reservation.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidTransition`] unless the invoice is a draft.
    pub async fn cancel(&self, id: SalesInvoiceId) -> Result<sales_invoices::Model, InvoiceRepoError> {
        let txn = self.db.begin().await?;

        let invoice = sales_invoices::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .ok_or(InvoiceRepoError::NotFound(id))?;
        let from: InvoiceStatus = invoice.status.into();
        let to = DocumentWorkflow::cancel_invoice(from)?;

        let updated = sales_invoices::Entity::update_many()
            .col_expr(sales_invoices::Column::Status, DbInvoiceStatus::from(to).as_enum())
            .col_expr(sales_invoices::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(sales_invoices::Column::Id.eq(invoice.id))
            .filter(sales_invoices::Column::Status.eq(DbInvoiceStatus::Draft))
            .exec(&txn)
            .await?;
        if updated.rows_affected == 0 {
            return Err(DocumentError::InvalidTransition {
                document: "sales invoice",
                from: from.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        let document = SalesDocument {
            id,
            number: invoice.number.clone(),
            items: Vec::new(),
        };
        let released = delete_movements(&txn, document.reservation_reference()).await?;
        let invoice = sales_invoices::Entity::find_by_id(invoice.id)
            .one(&txn)
            .await?
            .ok_or(InvoiceRepoError::NotFound(id))?;

        txn.commit().await?;
        tracing::info!(invoice_id = %invoice.id, released, "Sales invoice cancelled");
        Ok(invoice)
    }

    /// Deletes an invoice. A posted invoice has its entry reversed and its
    /// stock movements removed; reservations are always released.
    ///
    /// The invoice row stays locked until commit, so a concurrent post or
    /// delete sees either the untouched invoice or no invoice at all.
    ///
    /// # Errors
    ///
    /// Returns [`InvoiceRepoError::NotFound`] for an unknown invoice.
    pub async fn delete(&self, id: SalesInvoiceId) -> Result<(), InvoiceRepoError> {
        let txn = self.db.begin().await?;

        let invoice = sales_invoices::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(InvoiceRepoError::NotFound(id))?;
        let document = SalesDocument {
            id,
            number: invoice.number.clone(),
            items: Vec::new(),
        };

        if DocumentWorkflow::invoice_deletion(invoice.status.into()) == DeletionEffect::ReverseAndDelete {
            if let Some(entry_id) = invoice.ledger_entry_id {
                reverse_in(&txn, LedgerEntryId::from_uuid(entry_id)).await?;
            }
            delete_movements(&txn, document.sale_reference()).await?;
        }
        delete_movements(&txn, document.reservation_reference()).await?;

        sales_invoices::Entity::delete_by_id(invoice.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(invoice_id = %invoice.id, number = %invoice.number, "Sales invoice deleted");
        Ok(())
    }
}

fn to_document(invoice: &sales_invoices::Model, items: &[sales_invoice_items::Model]) -> SalesDocument {
    SalesDocument {
        id: SalesInvoiceId::from_uuid(invoice.id),
        number: invoice.number.clone(),
        items: items
            .iter()
            .map(|item| InvoiceItem {
                part_id: PartId::from_uuid(item.part_id),
                quantity: item.quantity,
                unit_price: item.unit_price,
                store_id: item.store_id.map(StoreId::from_uuid),
            })
            .collect(),
    }
}

fn part_ids(document: &SalesDocument) -> Vec<PartId> {
    let mut ids: Vec<PartId> = document.items.iter().map(|i| i.part_id).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    id: SalesInvoiceId,
) -> Result<Option<InvoiceDetail>, DbErr> {
    let Some(invoice) = sales_invoices::Entity::find_by_id(id.into_inner()).one(conn).await? else {
        return Ok(None);
    };
    let items = sales_invoice_items::Entity::find()
        .filter(sales_invoice_items::Column::SalesInvoiceId.eq(invoice.id))
        .order_by_asc(sales_invoice_items::Column::LineNo)
        .all(conn)
        .await?;
    Ok(Some(InvoiceDetail { invoice, items }))
}

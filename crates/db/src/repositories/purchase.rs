//! Purchase order repository.
//!
//! Purchase orders and direct purchase orders share one table; `kind`
//! decides the number prefix, the movement reference and the cost source.
//! Receiving runs the whole receipt plan inside one transaction.

use chrono::{NaiveDate, Utc};
use inventra_core::costing::CostFormula;
use inventra_core::documents::{
    DeletionEffect, DocumentError, DocumentWorkflow, PurchaseDocument, PurchaseExpense,
    PurchaseItem, PurchaseKind, PurchaseStatus, plan_receipt, validate_purchase_lines,
};
use inventra_core::stock::{DocumentRef, StockMovement};
use inventra_shared::AppError;
use inventra_shared::config::{CostingMethod, PostingConfig};
use inventra_shared::types::{
    AccountId, LedgerEntryId, PartId, PurchaseOrderId, StoreId, SupplierId,
};
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
    parts, purchase_order_expenses, purchase_order_items, purchase_orders,
    sea_orm_active_enums::{CostSource as DbCostSource, PurchaseStatus as DbPurchaseStatus},
    suppliers,
};

/// Error types for purchase order operations.
#[derive(Debug, thiserror::Error)]
pub enum PurchaseRepoError {
    /// Purchase order not found.
    #[error("Purchase order not found: {0}")]
    NotFound(PurchaseOrderId),

    /// Supplier not found.
    #[error("Supplier not found: {0}")]
    SupplierNotFound(SupplierId),

    /// Lifecycle or costing rule violated.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Posting accounts could not be resolved.
    #[error(transparent)]
    Account(#[from] AccountRepoError),

    /// The receipt entry was rejected.
    #[error(transparent)]
    Ledger(#[from] LedgerRepoError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<PurchaseRepoError> for AppError {
    fn from(err: PurchaseRepoError) -> Self {
        match err {
            PurchaseRepoError::NotFound(_) | PurchaseRepoError::SupplierNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            PurchaseRepoError::Document(e) => e.into(),
            PurchaseRepoError::Account(e) => e.into(),
            PurchaseRepoError::Ledger(e) => e.into(),
            PurchaseRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for creating a purchase order.
#[derive(Debug, Clone)]
pub struct CreatePurchaseInput {
    pub kind: PurchaseKind,
    pub supplier_id: SupplierId,
    pub order_date: NaiveDate,
    pub notes: Option<String>,
    pub items: Vec<PurchaseItem>,
    pub expenses: Vec<PurchaseExpense>,
}

/// A purchase order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseOrderDetail {
    pub order: purchase_orders::Model,
    pub items: Vec<purchase_order_items::Model>,
    pub expenses: Vec<purchase_order_expenses::Model>,
}

/// What receiving a purchase order wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptOutcome {
    pub purchase_order: purchase_orders::Model,
    pub movements: Vec<StockMovement>,
    /// `None` when the document carried no amounts.
    pub entry_id: Option<LedgerEntryId>,
    pub formulas: Vec<CostFormula>,
}

/// Purchase order repository.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    db: DatabaseConnection,
    posting: PostingConfig,
    costing_method: CostingMethod,
}

impl PurchaseRepository {
    /// Creates a new purchase order repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection, posting: PostingConfig, costing_method: CostingMethod) -> Self {
        Self {
            db,
            posting,
            costing_method,
        }
    }

    /// Creates a draft purchase order with a sequential number.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Validation`] for a bad quantity, price or expense.
    /// - [`PurchaseRepoError::SupplierNotFound`] for an unknown supplier.
    pub async fn create(
        &self,
        input: CreatePurchaseInput,
    ) -> Result<PurchaseOrderDetail, PurchaseRepoError> {
        validate_purchase_lines(&input.items, &input.expenses)?;
        let txn = self.db.begin().await?;

        suppliers::Entity::find_by_id(input.supplier_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(PurchaseRepoError::SupplierNotFound(input.supplier_id))?;

        let number = next_number(&txn, input.kind.prefix()).await?;
        let now = Utc::now().into();
        let order = purchase_orders::ActiveModel {
            id: Set(PurchaseOrderId::new().into_inner()),
            kind: Set(input.kind.into()),
            number: Set(number),
            supplier_id: Set(input.supplier_id.into_inner()),
            status: Set(DbPurchaseStatus::Draft),
            order_date: Set(input.order_date),
            notes: Set(input.notes),
            received_at: Set(None),
            ledger_entry_id: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let (items, expenses) = insert_lines(&txn, order.id, &input.items, &input.expenses).await?;
        txn.commit().await?;

        tracing::info!(purchase_order_id = %order.id, number = %order.number, "Purchase order created");
        Ok(PurchaseOrderDetail {
            order,
            items,
            expenses,
        })
    }

    /// Loads a purchase order with its lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get(&self, id: PurchaseOrderId) -> Result<Option<PurchaseOrderDetail>, PurchaseRepoError> {
        Ok(load_detail(&self.db, id).await?)
    }

    /// Replaces items and expenses of an editable order.
    ///
    /// # Errors
    ///
    /// - [`DocumentError::Validation`] for a bad quantity, price or expense.
    /// - [`DocumentError::InvalidTransition`] once the order was received or
    ///   cancelled.
    pub async fn replace_lines(
        &self,
        id: PurchaseOrderId,
        items: &[PurchaseItem],
        expenses: &[PurchaseExpense],
    ) -> Result<PurchaseOrderDetail, PurchaseRepoError> {
        validate_purchase_lines(items, expenses)?;
        let txn = self.db.begin().await?;

        let order = purchase_orders::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PurchaseRepoError::NotFound(id))?;
        let status: PurchaseStatus = order.status.into();
        if !status.is_editable() {
            return Err(DocumentError::InvalidTransition {
                document: "purchase order",
                from: status.to_string(),
                to: "edited".to_string(),
            }
            .into());
        }

        purchase_order_items::Entity::delete_many()
            .filter(purchase_order_items::Column::PurchaseOrderId.eq(order.id))
            .exec(&txn)
            .await?;
        purchase_order_expenses::Entity::delete_many()
            .filter(purchase_order_expenses::Column::PurchaseOrderId.eq(order.id))
            .exec(&txn)
            .await?;
        let (items, expenses) = insert_lines(&txn, order.id, items, expenses).await?;

        txn.commit().await?;
        Ok(PurchaseOrderDetail {
            order,
            items,
            expenses,
        })
    }

    /// Draft → Pending.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidTransition`] from any other status.
    pub async fn submit(&self, id: PurchaseOrderId) -> Result<purchase_orders::Model, PurchaseRepoError> {
        self.transition(id, DocumentWorkflow::submit).await
    }

    /// Received → Completed.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidTransition`] from any other status.
    pub async fn complete(&self, id: PurchaseOrderId) -> Result<purchase_orders::Model, PurchaseRepoError> {
        self.transition(id, DocumentWorkflow::complete).await
    }

    /// Draft | Pending → Cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::InvalidTransition`] once received.
    pub async fn cancel(&self, id: PurchaseOrderId) -> Result<purchase_orders::Model, PurchaseRepoError> {
        self.transition(id, DocumentWorkflow::cancel_purchase).await
    }

    /// Receives a purchase order: part costs, stock movements and the
    /// ledger entry are written in one transaction.
    ///
    /// The status change is a compare-and-set on `draft | pending`. A
    /// second or concurrent receive finds no row to claim and fails with
    /// [`DocumentError::AlreadyProcessed`] without writing anything.
    ///
    /// # Errors
    ///
    /// - [`PurchaseRepoError::NotFound`] for an unknown order.
    /// - [`DocumentError::AlreadyProcessed`] when already received.
    /// - [`DocumentError::Costing`] for invalid lines.
    /// - [`PurchaseRepoError::Ledger`] when the receipt entry is rejected.
    pub async fn receive(
        &self,
        id: PurchaseOrderId,
        received_on: NaiveDate,
    ) -> Result<ReceiptOutcome, PurchaseRepoError> {
        let txn = self.db.begin().await?;

        let order = purchase_orders::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .ok_or(PurchaseRepoError::NotFound(id))?;
        DocumentWorkflow::receive(order.status.into())?;

        let now = Utc::now();
        let claimed = purchase_orders::Entity::update_many()
            .col_expr(purchase_orders::Column::Status, DbPurchaseStatus::Received.as_enum())
            .col_expr(purchase_orders::Column::ReceivedAt, Expr::value(now))
            .col_expr(purchase_orders::Column::UpdatedAt, Expr::value(now))
            .filter(purchase_orders::Column::Id.eq(order.id))
            .filter(
                purchase_orders::Column::Status
                    .is_in(PurchaseStatus::RECEIVABLE.map(DbPurchaseStatus::from)),
            )
            .exec(&txn)
            .await?;

        if claimed.rows_affected == 0 {
            let current = purchase_orders::Entity::find_by_id(order.id)
                .one(&txn)
                .await?
                .ok_or(PurchaseRepoError::NotFound(id))?
                .status;
            tracing::warn!(purchase_order_id = %order.id, status = ?current, "Receive lost the status race");
            return Err(DocumentError::AlreadyProcessed {
                document: "purchase order",
                status: PurchaseStatus::from(current).to_string(),
            }
            .into());
        }

        let detail = load_detail(&txn, id).await?.ok_or(PurchaseRepoError::NotFound(id))?;
        let supplier = suppliers::Entity::find_by_id(order.supplier_id)
            .one(&txn)
            .await?
            .ok_or(PurchaseRepoError::SupplierNotFound(SupplierId::from_uuid(order.supplier_id)))?;
        let accounts = resolve_posting_accounts(&txn, &self.posting).await?;

        let document = to_document(&detail, supplier.payable_account_id.map(AccountId::from_uuid));
        let mut part_ids: Vec<PartId> = document.items.iter().map(|i| i.part_id).collect();
        part_ids.sort_unstable();
        part_ids.dedup();
        let (snapshots, _) = part_snapshots(&txn, &part_ids, None).await?;

        let plan = plan_receipt(&document, &snapshots, self.costing_method, &accounts, received_on)?;

        for update in &plan.cost_updates {
            parts::Entity::update_many()
                .col_expr(parts::Column::Cost, Expr::value(update.cost))
                .col_expr(parts::Column::CostSource, DbCostSource::from(update.source).as_enum())
                .col_expr(parts::Column::CostUpdatedAt, Expr::value(now))
                .col_expr(parts::Column::UpdatedAt, Expr::value(now))
                .filter(parts::Column::Id.eq(update.part_id.into_inner()))
                .exec(&txn)
                .await?;
        }
        insert_movements(&txn, &plan.movements).await?;

        let entry_id = match &plan.posting {
            Some(entry) => Some(LedgerEntryId::from_uuid(post_in(&txn, entry).await?.id)),
            None => None,
        };

        let mut active: purchase_orders::ActiveModel = detail.order.into();
        active.status = Set(DbPurchaseStatus::Received);
        active.ledger_entry_id = Set(entry_id.map(LedgerEntryId::into_inner));
        let purchase_order = active.update(&txn).await?;

        txn.commit().await?;

        tracing::info!(
            purchase_order_id = %purchase_order.id,
            number = %purchase_order.number,
            items_total = %plan.costing.items_total,
            expense_total = %plan.costing.expense_total,
            "Purchase order received"
        );
        Ok(ReceiptOutcome {
            purchase_order,
            movements: plan.movements,
            entry_id,
            formulas: plan.costing.formulas,
        })
    }

    /// Deletes a purchase order. A received order has its ledger entry
    /// reversed and its stock movements removed first. Part costs keep
    /// their received values.
    ///
    /// The order row is locked before its status is read. A receive that
    /// committed first is reversed; one still waiting finds no order.
    ///
    /// # Errors
    ///
    /// Returns [`PurchaseRepoError::NotFound`] for an unknown order.
    pub async fn delete(&self, id: PurchaseOrderId) -> Result<(), PurchaseRepoError> {
        let txn = self.db.begin().await?;

        let order = purchase_orders::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(PurchaseRepoError::NotFound(id))?;
        let status: PurchaseStatus = order.status.into();

        if DocumentWorkflow::purchase_deletion(status) == DeletionEffect::ReverseAndDelete {
            if let Some(entry_id) = order.ledger_entry_id {
                reverse_in(&txn, LedgerEntryId::from_uuid(entry_id)).await?;
            }
            let kind: PurchaseKind = order.kind.into();
            let removed =
                delete_movements(&txn, DocumentRef::new(kind.reference_type(), order.id)).await?;
            tracing::info!(purchase_order_id = %order.id, movements = removed, "Receipt reversed");
        }

        purchase_orders::Entity::delete_by_id(order.id).exec(&txn).await?;
        txn.commit().await?;

        tracing::info!(purchase_order_id = %order.id, number = %order.number, "Purchase order deleted");
        Ok(())
    }

    async fn transition(
        &self,
        id: PurchaseOrderId,
        rule: fn(PurchaseStatus) -> Result<PurchaseStatus, DocumentError>,
    ) -> Result<purchase_orders::Model, PurchaseRepoError> {
        let order = purchase_orders::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(PurchaseRepoError::NotFound(id))?;
        let from: PurchaseStatus = order.status.into();
        let to = rule(from)?;

        let updated = purchase_orders::Entity::update_many()
            .col_expr(purchase_orders::Column::Status, DbPurchaseStatus::from(to).as_enum())
            .col_expr(purchase_orders::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(purchase_orders::Column::Id.eq(order.id))
            .filter(purchase_orders::Column::Status.eq(order.status))
            .exec(&self.db)
            .await?;
        if updated.rows_affected == 0 {
            return Err(DocumentError::InvalidTransition {
                document: "purchase order",
                from: from.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        tracing::info!(purchase_order_id = %order.id, %from, %to, "Purchase order status changed");
        purchase_orders::Entity::find_by_id(order.id)
            .one(&self.db)
            .await?
            .ok_or(PurchaseRepoError::NotFound(id))
    }
}

fn to_document(detail: &PurchaseOrderDetail, payable_account: Option<AccountId>) -> PurchaseDocument {
    PurchaseDocument {
        id: PurchaseOrderId::from_uuid(detail.order.id),
        kind: detail.order.kind.into(),
        number: detail.order.number.clone(),
        payable_account,
        items: detail
            .items
            .iter()
            .map(|item| PurchaseItem {
                part_id: PartId::from_uuid(item.part_id),
                quantity: item.quantity,
                unit_price: item.unit_price,
                store_id: item.store_id.map(StoreId::from_uuid),
            })
            .collect(),
        expenses: detail
            .expenses
            .iter()
            .map(|expense| PurchaseExpense {
                label: expense.label.clone(),
                amount: expense.amount,
            })
            .collect(),
    }
}

async fn load_detail<C: ConnectionTrait>(
    conn: &C,
    id: PurchaseOrderId,
) -> Result<Option<PurchaseOrderDetail>, DbErr> {
    let Some(order) = purchase_orders::Entity::find_by_id(id.into_inner()).one(conn).await? else {
        return Ok(None);
    };
    let items = purchase_order_items::Entity::find()
        .filter(purchase_order_items::Column::PurchaseOrderId.eq(order.id))
        .order_by_asc(purchase_order_items::Column::LineNo)
        .all(conn)
        .await?;
    let expenses = purchase_order_expenses::Entity::find()
        .filter(purchase_order_expenses::Column::PurchaseOrderId.eq(order.id))
        .all(conn)
        .await?;
    Ok(Some(PurchaseOrderDetail {
        order,
        items,
        expenses,
    }))
}

async fn insert_lines<C: ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
    items: &[PurchaseItem],
    expenses: &[PurchaseExpense],
) -> Result<(Vec<purchase_order_items::Model>, Vec<purchase_order_expenses::Model>), DbErr> {
    let mut item_rows = Vec::with_capacity(items.len());
    for (item, line_no) in items.iter().zip(1..) {
        let row = purchase_order_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            purchase_order_id: Set(order_id),
            line_no: Set(line_no),
            part_id: Set(item.part_id.into_inner()),
            store_id: Set(item.store_id.map(StoreId::into_inner)),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
        }
        .insert(conn)
        .await?;
        item_rows.push(row);
    }

    let mut expense_rows = Vec::with_capacity(expenses.len());
    for expense in expenses {
        let row = purchase_order_expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            purchase_order_id: Set(order_id),
            label: Set(expense.label.clone()),
            amount: Set(expense.amount),
        }
        .insert(conn)
        .await?;
        expense_rows.push(row);
    }

    Ok((item_rows, expense_rows))
}

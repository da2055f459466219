//! Stock repository: movement log, derived levels, adjustments and orphans.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use inventra_core::catalog::PartSnapshot;
use inventra_core::documents::{DocumentError, StockAdjustment, plan_adjustment};
use inventra_core::stock::{
    DocumentRef, ReferenceType, StockLevel, StockMovement, find_orphans, on_hand_by_part,
    quantity_in_store, stock_levels,
};
use inventra_shared::AppError;
use inventra_shared::types::{PartId, StockAdjustmentId, StockMovementId, StoreId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::{
    parts, purchase_orders, sales_invoices,
    sea_orm_active_enums::{PurchaseKind, ReferenceType as DbReferenceType},
    stock_adjustments, stock_movements,
};

/// Error types for stock operations.
#[derive(Debug, thiserror::Error)]
pub enum StockRepoError {
    /// Part not found.
    #[error("Part not found: {0}")]
    PartNotFound(PartId),

    /// Adjustment rejected.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<StockRepoError> for AppError {
    fn from(err: StockRepoError) -> Self {
        match err {
            StockRepoError::PartNotFound(_) => Self::NotFound(err.to_string()),
            StockRepoError::Document(e) => e.into(),
            StockRepoError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for a manual adjustment.
#[derive(Debug, Clone)]
pub struct AdjustStockInput {
    pub part_id: PartId,
    pub store_id: Option<StoreId>,
    /// Positive adds stock, negative removes it.
    pub delta: i64,
    pub reason: String,
    pub adjusted_on: NaiveDate,
}

/// A recorded adjustment and the movement it produced.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub adjustment: stock_adjustments::Model,
    pub movement: StockMovement,
}

/// Stock repository.
#[derive(Debug, Clone)]
pub struct StockRepository {
    db: DatabaseConnection,
}

impl StockRepository {
    /// Creates a new stock repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Quantity of a part across all stores.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn on_hand(&self, part_id: PartId) -> Result<i64, StockRepoError> {
        let totals = on_hand_for(&self.db, &[part_id], None).await?;
        Ok(totals.get(&part_id).copied().unwrap_or(0))
    }

    /// Quantity of a part in one store; `None` is the unassigned store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn on_hand_in_store(
        &self,
        part_id: PartId,
        store_id: Option<StoreId>,
    ) -> Result<i64, StockRepoError> {
        let movements = load_movements(&self.db, Some(&[part_id])).await?;
        Ok(quantity_in_store(part_id, store_id, &movements))
    }

    /// Quantities per part and store.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn levels(&self) -> Result<Vec<StockLevel>, StockRepoError> {
        let movements = load_movements(&self.db, None).await?;
        Ok(stock_levels(&movements))
    }

    /// Movements stamped with a document, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn movements_for(
        &self,
        reference: DocumentRef,
    ) -> Result<Vec<stock_movements::Model>, StockRepoError> {
        Ok(stock_movements::Entity::find()
            .filter(stock_movements::Column::ReferenceType.eq(DbReferenceType::from(reference.reference_type)))
            .filter(stock_movements::Column::ReferenceId.eq(reference.id))
            .order_by_asc(stock_movements::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Records a counted correction and its movement.
    ///
    /// The part row is locked so a concurrent removal cannot take stock
    /// below zero.
    ///
    /// # Errors
    ///
    /// - [`StockRepoError::PartNotFound`] for an unknown part.
    /// - [`DocumentError::Stock`] when removing more than is on hand.
    pub async fn adjust(&self, input: AdjustStockInput) -> Result<AdjustmentOutcome, StockRepoError> {
        let txn = self.db.begin().await?;

        let part = lock_parts(&txn, &[input.part_id])
            .await?
            .into_iter()
            .next()
            .ok_or(StockRepoError::PartNotFound(input.part_id))?;
        let on_hand = on_hand_for(&txn, &[input.part_id], None)
            .await?
            .get(&input.part_id)
            .copied()
            .unwrap_or(0);

        let adjustment = StockAdjustment {
            id: StockAdjustmentId::new(),
            part_id: input.part_id,
            store_id: input.store_id,
            delta: input.delta,
            reason: input.reason,
        };
        let movement = plan_adjustment(&adjustment, on_hand, part.cost)?;

        let record = stock_adjustments::ActiveModel {
            id: Set(adjustment.id.into_inner()),
            part_id: Set(adjustment.part_id.into_inner()),
            store_id: Set(adjustment.store_id.map(StoreId::into_inner)),
            delta: Set(adjustment.delta),
            reason: Set(adjustment.reason.trim().to_string()),
            adjusted_on: Set(input.adjusted_on),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;
        insert_movements(&txn, std::slice::from_ref(&movement)).await?;

        txn.commit().await?;
        tracing::info!(
            part_no = %part.part_no,
            delta = adjustment.delta,
            on_hand = on_hand + movement.signed_quantity(),
            "Stock adjusted"
        );
        Ok(AdjustmentOutcome {
            adjustment: record,
            movement,
        })
    }

    /// Movements whose originating document no longer exists.
    ///
    /// Movements are read before documents: a movement commits together with
    /// its document, so any movement seen here has a visible document unless
    /// it was really deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_orphans(&self) -> Result<Vec<stock_movements::Model>, StockRepoError> {
        let rows = stock_movements::Entity::find()
            .order_by_asc(stock_movements::Column::CreatedAt)
            .all(&self.db)
            .await?;
        let existing = existing_documents(&self.db).await?;

        let keyed: Vec<(usize, DocumentRef)> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| (i, row_reference(row)))
            .collect();
        let orphaned: HashSet<usize> = find_orphans(&keyed, &existing).into_iter().collect();

        Ok(rows
            .into_iter()
            .enumerate()
            .filter(|(i, _)| orphaned.contains(i))
            .map(|(_, row)| row)
            .collect())
    }

    /// Deletes orphaned movements and returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn delete_orphans(&self) -> Result<u64, StockRepoError> {
        let ids: Vec<Uuid> = self.find_orphans().await?.into_iter().map(|m| m.id).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        let result = stock_movements::Entity::delete_many()
            .filter(stock_movements::Column::Id.is_in(ids))
            .exec(&self.db)
            .await?;
        tracing::warn!(deleted = result.rows_affected, "Orphaned stock movements deleted");
        Ok(result.rows_affected)
    }
}

fn row_reference(row: &stock_movements::Model) -> DocumentRef {
    DocumentRef::new(row.reference_type.into(), row.reference_id)
}

fn to_movement(row: stock_movements::Model) -> StockMovement {
    StockMovement {
        part_id: PartId::from_uuid(row.part_id),
        store_id: row.store_id.map(StoreId::from_uuid),
        direction: row.direction.into(),
        quantity: row.quantity,
        reference: row_reference(&row),
        unit_cost: row.unit_cost,
    }
}

/// Every document a movement may point at.
async fn existing_documents<C: ConnectionTrait>(conn: &C) -> Result<HashSet<DocumentRef>, DbErr> {
    let mut existing = HashSet::new();

    for order in purchase_orders::Entity::find().all(conn).await? {
        let reference_type = match order.kind {
            PurchaseKind::Po => ReferenceType::Purchase,
            PurchaseKind::Dpo => ReferenceType::DirectPurchase,
        };
        existing.insert(DocumentRef::new(reference_type, order.id));
    }
    for invoice in sales_invoices::Entity::find().all(conn).await? {
        existing.insert(DocumentRef::new(ReferenceType::Sale, invoice.id));
        existing.insert(DocumentRef::new(ReferenceType::Reservation, invoice.id));
    }
    for adjustment in stock_adjustments::Entity::find().all(conn).await? {
        existing.insert(DocumentRef::new(ReferenceType::Adjustment, adjustment.id));
    }

    Ok(existing)
}

/// Loads movements, optionally only for some parts.
pub(crate) async fn load_movements<C: ConnectionTrait>(
    conn: &C,
    part_ids: Option<&[PartId]>,
) -> Result<Vec<StockMovement>, DbErr> {
    let mut query = stock_movements::Entity::find();
    if let Some(ids) = part_ids {
        query = query.filter(
            stock_movements::Column::PartId.is_in(ids.iter().map(|id| id.into_inner())),
        );
    }
    Ok(query.all(conn).await?.into_iter().map(to_movement).collect())
}

/// On-hand quantity per part, leaving out movements of `excluding`.
pub(crate) async fn on_hand_for<C: ConnectionTrait>(
    conn: &C,
    part_ids: &[PartId],
    excluding: Option<DocumentRef>,
) -> Result<HashMap<PartId, i64>, DbErr> {
    let movements = load_movements(conn, Some(part_ids)).await?;
    Ok(on_hand_by_part(
        movements
            .iter()
            .filter(|m| excluding.is_none_or(|r| m.reference != r)),
    ))
}

/// Selects part rows `FOR UPDATE`, in id order.
pub(crate) async fn lock_parts<C: ConnectionTrait>(
    conn: &C,
    part_ids: &[PartId],
) -> Result<Vec<parts::Model>, DbErr> {
    parts::Entity::find()
        .filter(parts::Column::Id.is_in(part_ids.iter().map(|id| id.into_inner())))
        .order_by_asc(parts::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await
}

/// Locks parts and captures their cost and on-hand quantity.
pub(crate) async fn part_snapshots<C: ConnectionTrait>(
    conn: &C,
    part_ids: &[PartId],
    excluding: Option<DocumentRef>,
) -> Result<(HashMap<PartId, PartSnapshot>, HashMap<PartId, i64>), DbErr> {
    let locked = lock_parts(conn, part_ids).await?;
    let on_hand = on_hand_for(conn, part_ids, excluding).await?;

    let snapshots = locked
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
    Ok((snapshots, on_hand))
}

pub(crate) async fn insert_movements<C: ConnectionTrait>(
    conn: &C,
    movements: &[StockMovement],
) -> Result<(), DbErr> {
    if movements.is_empty() {
        return Ok(());
    }
    let now = Utc::now().into();
    let rows: Vec<stock_movements::ActiveModel> = movements
        .iter()
        .map(|m| stock_movements::ActiveModel {
            id: Set(StockMovementId::new().into_inner()),
            part_id: Set(m.part_id.into_inner()),
            store_id: Set(m.store_id.map(StoreId::into_inner)),
            direction: Set(m.direction.into()),
            quantity: Set(m.quantity),
            reference_type: Set(m.reference.reference_type.into()),
            reference_id: Set(m.reference.id),
            unit_cost: Set(m.unit_cost),
            created_at: Set(now),
        })
        .collect();
    stock_movements::Entity::insert_many(rows).exec(conn).await?;
    Ok(())
}

/// Removes every movement stamped with `reference`.
pub(crate) async fn delete_movements<C: ConnectionTrait>(
    conn: &C,
    reference: DocumentRef,
) -> Result<u64, DbErr> {
    let result = stock_movements::Entity::delete_many()
        .filter(stock_movements::Column::ReferenceType.eq(DbReferenceType::from(reference.reference_type)))
        .filter(stock_movements::Column::ReferenceId.eq(reference.id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

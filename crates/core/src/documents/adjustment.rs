//! Manual stock adjustments.
//!
//! Adjustments correct counted stock. They move quantity only and post
//! nothing to the ledger.

use inventra_shared::types::{PartId, StockAdjustmentId, StoreId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DocumentError;
use crate::stock::{DocumentRef, MovementDirection, ReferenceType, StockError, StockMovement};

/// A counted correction for one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustment {
    pub id: StockAdjustmentId,
    pub part_id: PartId,
    pub store_id: Option<StoreId>,
    /// Positive adds stock, negative removes it.
    pub delta: i64,
    pub reason: String,
}

impl StockAdjustment {
    /// Reference stamped on the movement.
    #[must_use]
    pub const fn reference(&self) -> DocumentRef {
        DocumentRef::new(ReferenceType::Adjustment, self.id.into_inner())
    }
}

/// Plans the movement for an adjustment.
///
/// `on_hand` is the part's quantity across all stores; a removal may not
/// take it below zero. The movement carries `unit_cost`.
///
/// # Errors
///
/// - [`DocumentError::Validation`] for a zero delta or a blank reason.
/// - [`DocumentError::Stock`] when removing more than is on hand.
pub fn plan_adjustment(
    adjustment: &StockAdjustment,
    on_hand: i64,
    unit_cost: Decimal,
) -> Result<StockMovement, DocumentError> {
    if adjustment.delta == 0 {
        return Err(DocumentError::Validation {
            field: "delta",
            reason: "must not be zero",
        });
    }
    if adjustment.reason.trim().is_empty() {
        return Err(DocumentError::Validation {
            field: "reason",
            reason: "must not be empty",
        });
    }

    let direction = if adjustment.delta > 0 {
        MovementDirection::In
    } else {
        MovementDirection::Out
    };
    let quantity = adjustment.delta.unsigned_abs();
    let quantity = i64::try_from(quantity).map_err(|_| StockError::InvalidQuantity(adjustment.delta))?;

    if direction == MovementDirection::Out && quantity > on_hand {
        return Err(StockError::InsufficientStock {
            part_id: adjustment.part_id,
            requested: quantity,
            available: on_hand,
        }
        .into());
    }

    StockMovement::new(
        adjustment.part_id,
        adjustment.store_id,
        direction,
        quantity,
        adjustment.reference(),
        Some(unit_cost),
    )
    .map_err(DocumentError::from)
}

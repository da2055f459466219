//! Stock movement types.

use inventra_shared::types::{PartId, StoreId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::StockError;

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    /// Stock coming in.
    In,
    /// Stock going out.
    Out,
}

impl MovementDirection {
    /// `1` for in, `-1` for out.
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::In => 1,
            Self::Out => -1,
        }
    }
}

/// Kind of document a movement or ledger entry originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// Received purchase order.
    Purchase,
    /// Received direct purchase order.
    DirectPurchase,
    /// Posted sales invoice.
    Sale,
    /// Manual stock adjustment.
    Adjustment,
    /// Stock held for a draft sales invoice.
    Reservation,
}

impl ReferenceType {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::DirectPurchase => "direct_purchase",
            Self::Sale => "sale",
            Self::Adjustment => "adjustment",
            Self::Reservation => "reservation",
        }
    }
}

/// Pointer from a movement or entry back to its originating document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    pub reference_type: ReferenceType,
    pub id: Uuid,
}

impl DocumentRef {
    /// Creates a new document reference.
    #[must_use]
    pub const fn new(reference_type: ReferenceType, id: Uuid) -> Self {
        Self { reference_type, id }
    }
}

/// One append-only quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub part_id: PartId,
    /// `None` means the default (unassigned) store.
    pub store_id: Option<StoreId>,
    pub direction: MovementDirection,
    /// Always positive; the direction carries the sign.
    pub quantity: i64,
    pub reference: DocumentRef,
    /// Unit cost at the time of the movement.
    pub unit_cost: Option<Decimal>,
}

impl StockMovement {
    /// Builds a movement, rejecting non-positive quantities.
    pub fn new(
        part_id: PartId,
        store_id: Option<StoreId>,
        direction: MovementDirection,
        quantity: i64,
        reference: DocumentRef,
        unit_cost: Option<Decimal>,
    ) -> Result<Self, StockError> {
        if quantity <= 0 {
            return Err(StockError::InvalidQuantity(quantity));
        }
        Ok(Self {
            part_id,
            store_id,
            direction,
            quantity,
            reference,
            unit_cost,
        })
    }

    /// Quantity with the direction's sign applied.
    #[must_use]
    pub const fn signed_quantity(&self) -> i64 {
        self.direction.sign() * self.quantity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_quantity() {
        let reference = DocumentRef::new(ReferenceType::Sale, Uuid::nil());
        let out = StockMovement::new(PartId::new(), None, MovementDirection::Out, 4, reference, None)
            .unwrap();
        assert_eq!(out.signed_quantity(), -4);
    }

    #[test]
    fn test_rejects_non_positive_quantity() {
        let reference = DocumentRef::new(ReferenceType::Adjustment, Uuid::nil());
        assert_eq!(
            StockMovement::new(PartId::new(), None, MovementDirection::In, 0, reference, None),
            Err(StockError::InvalidQuantity(0))
        );
    }

    #[test]
    fn test_reference_type_strings() {
        assert_eq!(ReferenceType::DirectPurchase.as_str(), "direct_purchase");
        assert_eq!(
            serde_json::to_string(&ReferenceType::Reservation).unwrap(),
            "\"reservation\""
        );
    }
}

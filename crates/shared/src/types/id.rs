//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `PartId` where an `AccountId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(PartId, "Unique identifier for a catalog part.");
typed_id!(BrandId, "Unique identifier for a part brand.");
typed_id!(CategoryId, "Unique identifier for a part category.");
typed_id!(SubcategoryId, "Unique identifier for a part subcategory.");
typed_id!(ApplicationId, "Unique identifier for a part application (vehicle/machine fit).");
typed_id!(SupplierId, "Unique identifier for a supplier.");
typed_id!(StoreId, "Unique identifier for a stock-holding store.");
typed_id!(MainGroupId, "Unique identifier for a chart-of-accounts main group.");
typed_id!(SubgroupId, "Unique identifier for a chart-of-accounts subgroup.");
typed_id!(
    AccountId,
    "Unique identifier for a chart of accounts entry."
);
typed_id!(LedgerEntryId, "Unique identifier for a journal entry or voucher.");
typed_id!(LedgerLineId, "Unique identifier for a ledger line.");
typed_id!(PurchaseOrderId, "Unique identifier for a purchase order or direct purchase order.");
typed_id!(SalesInvoiceId, "Unique identifier for a sales invoice.");
typed_id!(StockMovementId, "Unique identifier for a stock movement.");
typed_id!(StockAdjustmentId, "Unique identifier for a manual stock adjustment.");

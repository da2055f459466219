//! Conversions between database enums and their domain counterparts.

use inventra_core::catalog::CostSource as DomainCostSource;
use inventra_core::documents::{
    InvoiceStatus as DomainInvoiceStatus, PurchaseKind as DomainPurchaseKind,
    PurchaseStatus as DomainPurchaseStatus,
};
use inventra_core::ledger::{
    AccountType as DomainAccountType, EntryKind as DomainEntryKind,
    EntryStatus as DomainEntryStatus, VoucherType as DomainVoucherType,
};
use inventra_core::stock::{
    MovementDirection as DomainMovementDirection, ReferenceType as DomainReferenceType,
};

use super::sea_orm_active_enums::{
    AccountType, CostSource, EntryKind, EntryStatus, InvoiceStatus, MovementDirection,
    PurchaseKind, PurchaseStatus, ReferenceType, VoucherType,
};

/// Both enums carry the same variants; map them one to one in each direction.
macro_rules! mirror_enum {
    ($db:ident, $domain:ident, [$($variant:ident),+ $(,)?]) => {
        impl From<$domain> for $db {
            fn from(value: $domain) -> Self {
                match value {
                    $($domain::$variant => Self::$variant,)+
                }
            }
        }

        impl From<$db> for $domain {
            fn from(value: $db) -> Self {
                match value {
                    $($db::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(AccountType, DomainAccountType, [Asset, Liability, Equity, Revenue, Expense, Cost]);
mirror_enum!(EntryKind, DomainEntryKind, [Journal, Voucher]);
mirror_enum!(VoucherType, DomainVoucherType, [Payment, Receipt, Journal, Contra]);
mirror_enum!(EntryStatus, DomainEntryStatus, [Draft, Posted]);
mirror_enum!(CostSource, DomainCostSource, [Manual, DpoReceived, PoReceived]);
mirror_enum!(PurchaseKind, DomainPurchaseKind, [Po, Dpo]);
mirror_enum!(PurchaseStatus, DomainPurchaseStatus, [Draft, Pending, Received, Completed, Cancelled]);
mirror_enum!(InvoiceStatus, DomainInvoiceStatus, [Draft, Posted, Cancelled]);
mirror_enum!(MovementDirection, DomainMovementDirection, [In, Out]);
mirror_enum!(
    ReferenceType,
    DomainReferenceType,
    [Purchase, DirectPurchase, Sale, Adjustment, Reservation]
);

//! Document lifecycle planning.
//!
//! Purchase receipts, sales invoices and stock adjustments are planned here
//! as plain data: cost writes, stock movements and the ledger entry to
//! post. The database layer executes a plan inside one transaction.

mod adjustment;
mod error;
mod invoice;
mod purchase;
mod status;
mod validation;

pub use adjustment::{StockAdjustment, plan_adjustment};
pub use error::DocumentError;
pub use invoice::{InvoiceItem, SaleLineCost, SalePlan, SalesDocument, plan_reservation, plan_sale};
pub use purchase::{
    CostUpdate, PostingAccounts, PurchaseDocument, PurchaseExpense, PurchaseItem, ReceiptPlan,
    plan_receipt,
};
pub use status::{DeletionEffect, DocumentWorkflow, InvoiceStatus, PurchaseKind, PurchaseStatus};
pub use validation::{validate_invoice_items, validate_purchase_lines};

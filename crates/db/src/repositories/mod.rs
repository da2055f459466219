//! Repository abstractions for data access.
//!
//! Repositories execute the plans built in `inventra-core` inside one
//! database transaction each, hiding the `SeaORM` details from callers.

pub mod account;
pub mod catalog;
pub mod invoice;
pub mod ledger;
pub mod purchase;
pub mod report;
pub mod stock;

pub use account::{AccountRepoError, AccountRepository, CreateAccountInput};
pub use catalog::{
    CatalogRepoError, CatalogRepository, ImportSummary, PartClassification, PartRepository,
};
pub use invoice::{
    CreateInvoiceInput, InvoiceDetail, InvoiceRepoError, InvoiceRepository, SaleOutcome,
};
pub use ledger::{EntryWithLines, LedgerRepoError, LedgerRepository};
pub use purchase::{
    CreatePurchaseInput, PurchaseOrderDetail, PurchaseRepoError, PurchaseRepository,
    ReceiptOutcome,
};
pub use report::{ReportRepoError, ReportRepository};
pub use stock::{AdjustStockInput, AdjustmentOutcome, StockRepoError, StockRepository};

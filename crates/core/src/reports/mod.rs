//! Financial and stock report generation.
//!
//! This module provides pure business logic for generating reports:
//! - Trial Balance
//! - Balance Sheet
//! - Income Statement
//! - Account Ledger
//! - Balance reconciliation
//! - Stock on hand and valuation

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::ReportError;
pub use service::ReportService;
pub use types::*;

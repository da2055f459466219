//! Receipt planning for purchase orders and direct purchase orders.

use std::collections::HashMap;

use chrono::NaiveDate;
use inventra_shared::config::CostingMethod;
use inventra_shared::types::{AccountId, PartId, PurchaseOrderId, StoreId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DocumentError;
use super::status::PurchaseKind;
use crate::catalog::{CostSource, PartSnapshot};
use crate::costing::{ReceiptCosting, ReceiptLine, plan_receipt_costs};
use crate::ledger::{EntryInput, EntryKind, LineInput};
use crate::stock::{DocumentRef, MovementDirection, StockMovement};

/// Accounts used by generated entries, resolved from configured codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostingAccounts {
    pub inventory: AccountId,
    pub payable: AccountId,
    pub expense_clearing: AccountId,
    pub receivable: AccountId,
    pub sales: AccountId,
    pub cogs: AccountId,
}

/// One purchase line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub part_id: PartId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub store_id: Option<StoreId>,
}

/// Freight, duty and similar charges capitalised into landed cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseExpense {
    pub label: String,
    pub amount: Decimal,
}

/// A purchase document as loaded for receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseDocument {
    pub id: PurchaseOrderId,
    pub kind: PurchaseKind,
    pub number: String,
    /// Supplier's own payable account; the configured default otherwise.
    pub payable_account: Option<AccountId>,
    pub items: Vec<PurchaseItem>,
    pub expenses: Vec<PurchaseExpense>,
}

impl PurchaseDocument {
    /// Reference stamped on movements and the ledger entry.
    #[must_use]
    pub const fn reference(&self) -> DocumentRef {
        DocumentRef::new(self.kind.reference_type(), self.id.into_inner())
    }
}

/// A cost write for one part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CostUpdate {
    pub part_id: PartId,
    pub cost: Decimal,
    pub source: CostSource,
}

/// Everything receiving a purchase document writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptPlan {
    pub costing: ReceiptCosting,
    pub cost_updates: Vec<CostUpdate>,
    pub movements: Vec<StockMovement>,
    /// `None` when every amount on the document is zero.
    pub posting: Option<EntryInput>,
}

/// Plans the receipt of a purchase document.
///
/// Movements carry the landed cost of their line. The entry debits
/// inventory with items plus expenses, credits the payable account with
/// the items total and the expense clearing account with the expenses.
/// Zero-amount lines are left out.
///
/// # Errors
///
/// - [`DocumentError::NoItems`] for an empty document.
/// - [`DocumentError::Costing`] for invalid quantities, amounts or unknown parts.
pub fn plan_receipt(
    document: &PurchaseDocument,
    snapshots: &HashMap<PartId, PartSnapshot>,
    method: CostingMethod,
    accounts: &PostingAccounts,
    received_on: NaiveDate,
) -> Result<ReceiptPlan, DocumentError> {
    if document.items.is_empty() {
        return Err(DocumentError::NoItems);
    }

    let lines: Vec<ReceiptLine> = document
        .items
        .iter()
        .map(|item| ReceiptLine {
            part_id: item.part_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();
    let expenses: Vec<Decimal> = document.expenses.iter().map(|e| e.amount).collect();
    let costing = plan_receipt_costs(&lines, &expenses, snapshots, method)?;

    let source = document.kind.cost_source();
    let cost_updates = costing
        .new_costs
        .iter()
        .map(|(part_id, cost)| CostUpdate {
            part_id: *part_id,
            cost: *cost,
            source,
        })
        .collect();

    let reference = document.reference();
    let movements = document
        .items
        .iter()
        .zip(&costing.formulas)
        .map(|(item, formula)| {
            StockMovement::new(
                item.part_id,
                item.store_id,
                MovementDirection::In,
                item.quantity,
                reference,
                Some(formula.landed_cost),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let payable = document.payable_account.unwrap_or(accounts.payable);
    let mut entry_lines = Vec::with_capacity(3);
    if costing.inventory_total() > Decimal::ZERO {
        entry_lines.push(
            LineInput::debit(accounts.inventory, costing.inventory_total())
                .with_memo("Inventory received"),
        );
    }
    if costing.items_total > Decimal::ZERO {
        entry_lines.push(LineInput::credit(payable, costing.items_total).with_memo("Supplier payable"));
    }
    if costing.expense_total > Decimal::ZERO {
        entry_lines.push(
            LineInput::credit(accounts.expense_clearing, costing.expense_total)
                .with_memo("Purchase expenses"),
        );
    }

    let posting = (!entry_lines.is_empty()).then(|| EntryInput {
        kind: EntryKind::Journal,
        voucher_type: None,
        entry_date: received_on,
        description: format!("Receipt of {}", document.number),
        reference: Some(reference),
        lines: entry_lines,
    });

    Ok(ReceiptPlan {
        costing,
        cost_updates,
        movements,
        posting,
    })
}

//! Sales invoice posting and draft reservations.

use std::collections::HashMap;

use chrono::NaiveDate;
use inventra_shared::types::{PartId, SalesInvoiceId, StoreId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DocumentError;
use super::purchase::PostingAccounts;
use crate::catalog::PartSnapshot;
use crate::costing::{CostingError, calculate_cogs, round_money};
use crate::ledger::{EntryInput, EntryKind, LineInput, VoucherType};
use crate::stock::{DocumentRef, MovementDirection, ReferenceType, StockMovement, check_availability};

/// One invoiced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub part_id: PartId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub store_id: Option<StoreId>,
}

/// A sales invoice as loaded for posting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesDocument {
    pub id: SalesInvoiceId,
    pub number: String,
    pub items: Vec<InvoiceItem>,
}

impl SalesDocument {
    /// Reference stamped on sale movements and the entry.
    #[must_use]
    pub const fn sale_reference(&self) -> DocumentRef {
        DocumentRef::new(ReferenceType::Sale, self.id.into_inner())
    }

    /// Reference stamped on reservation movements.
    #[must_use]
    pub const fn reservation_reference(&self) -> DocumentRef {
        DocumentRef::new(ReferenceType::Reservation, self.id.into_inner())
    }

    fn requests(&self) -> Result<Vec<(PartId, i64)>, DocumentError> {
        if self.items.is_empty() {
            return Err(DocumentError::NoItems);
        }
        Ok(self.items.iter().map(|i| (i.part_id, i.quantity)).collect())
    }
}

/// Revenue and cost of one invoiced line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleLineCost {
    pub part_id: PartId,
    pub quantity: i64,
    pub unit_cost: Decimal,
    pub revenue: Decimal,
    pub cogs: Decimal,
}

/// Everything posting a sales invoice writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalePlan {
    pub lines: Vec<SaleLineCost>,
    pub movements: Vec<StockMovement>,
    pub revenue_total: Decimal,
    pub cogs_total: Decimal,
    /// `None` when revenue and cost are both zero.
    pub posting: Option<EntryInput>,
}

/// Plans posting a sales invoice.
///
/// `on_hand` must not include the invoice's own reservations. COGS uses
/// the part's current cost. Revenue (Dr receivable, Cr sales) and cost
/// (Dr COGS, Cr inventory) go into one journal voucher.
///
/// # Errors
///
/// - [`DocumentError::NoItems`] for an empty invoice.
/// - [`DocumentError::Stock`] when a part would go below zero.
/// - [`DocumentError::Costing`] for unknown parts or invalid amounts.
pub fn plan_sale(
    document: &SalesDocument,
    snapshots: &HashMap<PartId, PartSnapshot>,
    on_hand: &HashMap<PartId, i64>,
    accounts: &PostingAccounts,
    posted_on: NaiveDate,
) -> Result<SalePlan, DocumentError> {
    check_availability(&document.requests()?, on_hand)?;

    let reference = document.sale_reference();
    let mut lines = Vec::with_capacity(document.items.len());
    let mut movements = Vec::with_capacity(document.items.len());
    for item in &document.items {
        if item.unit_price < Decimal::ZERO {
            return Err(DocumentError::Validation {
                field: "unit_price",
                reason: "must not be negative",
            });
        }
        let snapshot = snapshots
            .get(&item.part_id)
            .ok_or(CostingError::PartNotFound(item.part_id))?;
        let cogs = calculate_cogs(item.quantity, snapshot.cost)?;

        movements.push(StockMovement::new(
            item.part_id,
            item.store_id,
            MovementDirection::Out,
            item.quantity,
            reference,
            Some(snapshot.cost),
        )?);
        lines.push(SaleLineCost {
            part_id: item.part_id,
            quantity: item.quantity,
            unit_cost: snapshot.cost,
            revenue: Decimal::from(item.quantity)
                .checked_mul(item.unit_price)
                .map(round_money)
                .ok_or(CostingError::Overflow("line revenue"))?,
            cogs,
        });
    }

    let revenue_total = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.revenue))
        .ok_or(CostingError::Overflow("revenue total"))?;
    let cogs_total = lines
        .iter()
        .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.cogs))
        .ok_or(CostingError::Overflow("cost of goods sold total"))?;

    let mut entry_lines = Vec::with_capacity(4);
    if revenue_total > Decimal::ZERO {
        entry_lines.push(LineInput::debit(accounts.receivable, revenue_total).with_memo("Customer receivable"));
        entry_lines.push(LineInput::credit(accounts.sales, revenue_total).with_memo("Sales"));
    }
    if cogs_total > Decimal::ZERO {
        entry_lines.push(LineInput::debit(accounts.cogs, cogs_total).with_memo("Cost of goods sold"));
        entry_lines.push(LineInput::credit(accounts.inventory, cogs_total).with_memo("Inventory issued"));
    }

    let posting = (!entry_lines.is_empty()).then(|| EntryInput {
        kind: EntryKind::Voucher,
        voucher_type: Some(VoucherType::Journal),
        entry_date: posted_on,
        description: format!("Sale {}", document.number),
        reference: Some(reference),
        lines: entry_lines,
    });

    Ok(SalePlan {
        lines,
        movements,
        revenue_total,
        cogs_total,
        posting,
    })
}

/// Plans reservation movements holding stock for a draft invoice.
///
/// `on_hand` includes reservations made by other invoices, so reserved
/// stock is not promised twice.
///
/// # Errors
///
/// - [`DocumentError::NoItems`] for an empty invoice.
/// - [`DocumentError::Stock`] when there is not enough free stock.
pub fn plan_reservation(
    document: &SalesDocument,
    on_hand: &HashMap<PartId, i64>,
) -> Result<Vec<StockMovement>, DocumentError> {
    check_availability(&document.requests()?, on_hand)?;

    let reference = document.reservation_reference();
    document
        .items
        .iter()
        .map(|item| {
            StockMovement::new(
                item.part_id,
                item.store_id,
                MovementDirection::Out,
                item.quantity,
                reference,
                None,
            )
            .map_err(DocumentError::from)
        })
        .collect()
}

//! Document kinds, statuses and the transitions between them.
//!
//! Purchase documents:
//! - Draft → Pending (submit)
//! - Draft | Pending → Received (receive)
//! - Received → Completed (complete)
//! - Draft | Pending → Cancelled (cancel)
//!
//! Sales invoices:
//! - Draft → Posted (post)
//! - Draft → Cancelled (cancel)
//!
//! Received, completed and posted documents only leave their state through
//! deletion with reversal.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DocumentError;
use crate::catalog::CostSource;
use crate::stock::ReferenceType;

/// Purchase order flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseKind {
    /// Purchase order raised ahead of delivery.
    Po,
    /// Direct purchase order recorded on delivery.
    Dpo,
}

impl PurchaseKind {
    /// Reference type used on movements and entries.
    #[must_use]
    pub const fn reference_type(self) -> ReferenceType {
        match self {
            Self::Po => ReferenceType::Purchase,
            Self::Dpo => ReferenceType::DirectPurchase,
        }
    }

    /// Cost source written to parts on receipt.
    #[must_use]
    pub const fn cost_source(self) -> CostSource {
        match self {
            Self::Po => CostSource::PoReceived,
            Self::Dpo => CostSource::DpoReceived,
        }
    }

    /// Document number prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Po => "PO",
            Self::Dpo => "DPO",
        }
    }
}

/// Purchase order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// Being prepared.
    Draft,
    /// Sent to the supplier, awaiting delivery.
    Pending,
    /// Goods received; cost, stock and ledger updated.
    Received,
    /// Closed after receipt.
    Completed,
    /// Abandoned before receipt.
    Cancelled,
}

impl PurchaseStatus {
    /// Statuses a document may be received from.
    pub const RECEIVABLE: [Self; 2] = [Self::Draft, Self::Pending];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Received => "received",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true once the receipt side effects exist.
    #[must_use]
    pub const fn has_side_effects(&self) -> bool {
        matches!(self, Self::Received | Self::Completed)
    }

    /// Returns true if items and expenses can still change.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sales invoice status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Being prepared; may hold reservations.
    Draft,
    /// Stock issued and revenue recognised.
    Posted,
    /// Abandoned before posting.
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Posted => "posted",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What deleting a document has to undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionEffect {
    /// Nothing was posted; drop the rows.
    DeleteOnly,
    /// Reverse the ledger entry and remove stock movements first.
    ReverseAndDelete,
}

/// Stateless transition rules.
pub struct DocumentWorkflow;

impl DocumentWorkflow {
    fn invalid(document: &'static str, from: impl fmt::Display, to: impl fmt::Display) -> DocumentError {
        DocumentError::InvalidTransition {
            document,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Draft → Pending.
    pub fn submit(current: PurchaseStatus) -> Result<PurchaseStatus, DocumentError> {
        match current {
            PurchaseStatus::Draft => Ok(PurchaseStatus::Pending),
            _ => Err(Self::invalid("purchase order", current, PurchaseStatus::Pending)),
        }
    }

    /// Draft | Pending → Received. A document already received is reported
    /// as processed so callers can tell a retry from a bad request.
    pub fn receive(current: PurchaseStatus) -> Result<PurchaseStatus, DocumentError> {
        match current {
            PurchaseStatus::Draft | PurchaseStatus::Pending => Ok(PurchaseStatus::Received),
            PurchaseStatus::Received | PurchaseStatus::Completed => {
                Err(DocumentError::AlreadyProcessed {
                    document: "purchase order",
                    status: current.to_string(),
                })
            }
            PurchaseStatus::Cancelled => {
                Err(Self::invalid("purchase order", current, PurchaseStatus::Received))
            }
        }
    }

    /// Received → Completed.
    pub fn complete(current: PurchaseStatus) -> Result<PurchaseStatus, DocumentError> {
        match current {
            PurchaseStatus::Received => Ok(PurchaseStatus::Completed),
            _ => Err(Self::invalid("purchase order", current, PurchaseStatus::Completed)),
        }
    }

    /// Draft | Pending → Cancelled.
    pub fn cancel_purchase(current: PurchaseStatus) -> Result<PurchaseStatus, DocumentError> {
        if current.is_editable() {
            return Ok(PurchaseStatus::Cancelled);
        }
        Err(Self::invalid("purchase order", current, PurchaseStatus::Cancelled))
    }

    /// Draft → Posted.
    pub fn post_invoice(current: InvoiceStatus) -> Result<InvoiceStatus, DocumentError> {
        match current {
            InvoiceStatus::Draft => Ok(InvoiceStatus::Posted),
            InvoiceStatus::Posted => Err(DocumentError::AlreadyProcessed {
                document: "sales invoice",
                status: current.to_string(),
            }),
            InvoiceStatus::Cancelled => {
                Err(Self::invalid("sales invoice", current, InvoiceStatus::Posted))
            }
        }
    }

    /// Draft → Cancelled.
    pub fn cancel_invoice(current: InvoiceStatus) -> Result<InvoiceStatus, DocumentError> {
        match current {
            InvoiceStatus::Draft => Ok(InvoiceStatus::Cancelled),
            _ => Err(Self::invalid("sales invoice", current, InvoiceStatus::Cancelled)),
        }
    }

    /// What deleting a purchase document in `status` must undo.
    #[must_use]
    pub const fn purchase_deletion(status: PurchaseStatus) -> DeletionEffect {
        if status.has_side_effects() {
            DeletionEffect::ReverseAndDelete
        } else {
            DeletionEffect::DeleteOnly
        }
    }

    /// What deleting a sales invoice in `status` must undo.
    #[must_use]
    pub const fn invoice_deletion(status: InvoiceStatus) -> DeletionEffect {
        match status {
            InvoiceStatus::Posted => DeletionEffect::ReverseAndDelete,
            InvoiceStatus::Draft | InvoiceStatus::Cancelled => DeletionEffect::DeleteOnly,
        }
    }
}

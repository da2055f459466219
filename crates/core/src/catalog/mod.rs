//! Parts catalog rules.
//!
//! Part validation, price tiers, cost provenance, and canonical selection
//! among legacy rows that share a part number.

mod canonical;
mod error;
mod types;

pub use canonical::{CanonicalCandidate, CollapsedParts, canonical_order, collapse_duplicates, select_canonical};
pub use error::CatalogError;
pub use types::{
    CostSource, LegacyPart, PartInput, PartSnapshot, PriceTier, PriceTiers, normalize_part_no,
};

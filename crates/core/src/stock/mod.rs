//! Stock movements and the quantities derived from them.
//!
//! Stock is never stored as a number; it is always the signed sum of the
//! append-only movement log.

mod error;
mod levels;
mod types;

pub use error::StockError;
pub use levels::{
    StockLevel, check_availability, find_orphans, on_hand_by_part, quantity_in_store, stock_levels,
};
pub use types::{DocumentRef, MovementDirection, ReferenceType, StockMovement};

//! Costing engine.
//!
//! Pure functions for average cost, landed cost, expense distribution and
//! COGS, plus the receipt planner that ties them together.
//!
//! All amounts are [`rust_decimal::Decimal`]; no floating point anywhere.

mod allocation;
mod error;
mod formulas;
mod receipt;

pub use allocation::{distribute_expenses_by_value, split_evenly};
pub use error::CostingError;
pub use formulas::{
    COST_SCALE, MONEY_SCALE, calculate_average_cost, calculate_cogs, calculate_landed_cost,
    calculate_stock_quantity, round_cost, round_money,
};
pub use receipt::{CostFormula, ReceiptCosting, ReceiptLine, plan_receipt_costs};

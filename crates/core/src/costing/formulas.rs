//! Cost formulas: average cost, landed cost, COGS and stock quantity.
//!
//! Unit costs carry [`COST_SCALE`] decimal places, ledger amounts carry
//! [`MONEY_SCALE`]. Both round with banker's rounding.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::CostingError;
use crate::stock::StockMovement;
use inventra_shared::types::PartId;

/// Decimal places kept on per-unit costs.
pub const COST_SCALE: u32 = 4;

/// Decimal places kept on ledger amounts and expense shares.
pub const MONEY_SCALE: u32 = 2;

/// Rounds a per-unit cost to [`COST_SCALE`].
#[must_use]
pub fn round_cost(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(COST_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Rounds a monetary amount to [`MONEY_SCALE`].
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

pub(crate) fn ensure_quantity(field: &'static str, qty: i64) -> Result<(), CostingError> {
    if qty < 0 {
        return Err(CostingError::negative(field));
    }
    Ok(())
}

pub(crate) fn ensure_amount(field: &'static str, amount: Decimal) -> Result<(), CostingError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(CostingError::negative(field));
    }
    Ok(())
}

/// Quantity-weighted average of the stock on hand and an incoming lot.
///
/// `(old_qty * old_avg_cost + incoming_qty * incoming_unit_cost) / (old_qty + incoming_qty)`,
/// or `incoming_unit_cost` when the combined quantity is zero.
///
/// # Errors
///
/// Returns [`CostingError::Validation`] for negative quantities or costs.
pub fn calculate_average_cost(
    old_qty: i64,
    old_avg_cost: Decimal,
    incoming_qty: i64,
    incoming_unit_cost: Decimal,
) -> Result<Decimal, CostingError> {
    ensure_quantity("old_qty", old_qty)?;
    ensure_quantity("incoming_qty", incoming_qty)?;
    ensure_amount("old_avg_cost", old_avg_cost)?;
    ensure_amount("incoming_unit_cost", incoming_unit_cost)?;

    let total_qty = old_qty
        .checked_add(incoming_qty)
        .ok_or(CostingError::Overflow("average cost quantity"))?;
    if total_qty == 0 {
        return Ok(incoming_unit_cost);
    }

    let old_value = Decimal::from(old_qty)
        .checked_mul(old_avg_cost)
        .ok_or(CostingError::Overflow("average cost value"))?;
    let incoming_value = Decimal::from(incoming_qty)
        .checked_mul(incoming_unit_cost)
        .ok_or(CostingError::Overflow("average cost value"))?;
    let total_value = old_value
        .checked_add(incoming_value)
        .ok_or(CostingError::Overflow("average cost value"))?;

    Ok(round_cost(total_value / Decimal::from(total_qty)))
}

/// Per-unit purchase price plus its allocated share of incidental expenses.
///
/// # Errors
///
/// Returns [`CostingError::Validation`] for negative inputs.
pub fn calculate_landed_cost(
    unit_purchase_price: Decimal,
    expense_per_unit: Decimal,
) -> Result<Decimal, CostingError> {
    ensure_amount("unit_purchase_price", unit_purchase_price)?;
    ensure_amount("expense_per_unit", expense_per_unit)?;
    Ok(round_cost(unit_purchase_price + expense_per_unit))
}

/// Cost of goods sold at the current average cost.
///
/// # Errors
///
/// Returns [`CostingError::Validation`] for negative inputs.
pub fn calculate_cogs(quantity_sold: i64, unit_cost: Decimal) -> Result<Decimal, CostingError> {
    ensure_quantity("quantity_sold", quantity_sold)?;
    ensure_amount("unit_cost", unit_cost)?;
    Decimal::from(quantity_sold)
        .checked_mul(unit_cost)
        .map(round_money)
        .ok_or(CostingError::Overflow("cost of goods sold"))
}

/// Signed sum of every movement recorded for `part_id`.
///
/// Addition is commutative, so the result does not depend on the order the
/// movements were inserted in.
#[must_use]
pub fn calculate_stock_quantity<'a, I>(part_id: PartId, movements: I) -> i64
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    movements
        .into_iter()
        .filter(|m| m.part_id == part_id)
        .map(StockMovement::signed_quantity)
        .sum()
}

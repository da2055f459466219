//! Expense allocation using the Largest Remainder Method.
//!
//! Every allocation is rounded down to [`MONEY_SCALE`] first, then the
//! leftover cents go one at a time to the lines with the largest fractional
//! remainders. The shares therefore always sum to the rounded total.

use rust_decimal::prelude::*;

use super::error::CostingError;
use super::formulas::{MONEY_SCALE, ensure_amount, round_money};

fn unit() -> Decimal {
    Decimal::new(1, MONEY_SCALE)
}

fn truncate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero)
}

fn units_in(remainder: Decimal) -> usize {
    let units = (remainder / unit())
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_u64()
        .unwrap_or(0);
    usize::try_from(units).unwrap_or(0)
}

/// Splits `total` evenly across `count` lines.
///
/// `100 / 3` gives `[33.34, 33.33, 33.33]`.
#[must_use]
pub fn split_evenly(total: Decimal, count: usize) -> Vec<Decimal> {
    if count == 0 {
        return vec![];
    }

    let total = round_money(total);
    let count_dec = Decimal::from(count);
    let base = truncate(total / count_dec);
    let extra = units_in(total - base * count_dec);

    (0..count)
        .map(|i| if i < extra { base + unit() } else { base })
        .collect()
}

/// Splits `total` proportionally to `weights`.
///
/// The weights must not all be zero; callers handle that case.
fn split_by_weights(
    total: Decimal,
    weights: &[Decimal],
    weight_sum: Decimal,
) -> Result<Vec<Decimal>, CostingError> {
    let total = round_money(total);
    let exact = weights
        .iter()
        .map(|w| total.checked_mul(*w).and_then(|v| v.checked_div(weight_sum)))
        .collect::<Option<Vec<Decimal>>>()
        .ok_or(CostingError::Overflow("expense share"))?;
    let mut shares: Vec<Decimal> = exact.iter().copied().map(truncate).collect();

    let allocated: Decimal = shares.iter().copied().sum();
    let extra = units_in(total - allocated);
    if extra == 0 {
        return Ok(shares);
    }

    let mut remainders: Vec<(usize, Decimal)> = exact
        .iter()
        .zip(shares.iter())
        .enumerate()
        .map(|(i, (e, s))| (i, *e - *s))
        .collect();
    // Stable sort keeps earlier lines first on equal remainders.
    remainders.sort_by(|a, b| b.1.cmp(&a.1));

    for (idx, _) in remainders.iter().take(extra) {
        shares[*idx] += unit();
    }

    Ok(shares)
}

/// Distributes `total_expense` over lines in proportion to their value.
///
/// Each share is `total_expense * value / sum(values)`. When every value is
/// zero the expense is split evenly, so free-of-charge lines still absorb
/// freight. The returned shares always sum to `total_expense` rounded to
/// [`MONEY_SCALE`].
///
/// # Errors
///
/// - [`CostingError::Validation`] for a negative value or expense.
/// - [`CostingError::NoItemsForExpense`] when a non-zero expense has no lines.
/// - [`CostingError::Overflow`] when values exceed the decimal range.
pub fn distribute_expenses_by_value(
    values: &[Decimal],
    total_expense: Decimal,
) -> Result<Vec<Decimal>, CostingError> {
    ensure_amount("total_expense", total_expense)?;
    for value in values {
        ensure_amount("item_value", *value)?;
    }

    if values.is_empty() {
        if total_expense.is_zero() {
            return Ok(vec![]);
        }
        return Err(CostingError::NoItemsForExpense(total_expense));
    }

    let sum = values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or(CostingError::Overflow("item value total"))?;
    if sum.is_zero() {
        return Ok(split_evenly(total_expense, values.len()));
    }

    split_by_weights(total_expense, values, sum)
}

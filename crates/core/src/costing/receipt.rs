//! Receipt costing: from received lines and expenses to new part costs.

use std::collections::HashMap;

use inventra_shared::config::CostingMethod;
use inventra_shared::types::PartId;
use rust_decimal::Decimal;
use serde::Serialize;

use super::allocation::distribute_expenses_by_value;
use super::error::CostingError;
use super::formulas::{
    calculate_average_cost, calculate_landed_cost, ensure_amount, round_cost, round_money,
};
use crate::catalog::PartSnapshot;

/// One received line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptLine {
    pub part_id: PartId,
    pub quantity: i64,
    pub unit_price: Decimal,
}

impl ReceiptLine {
    /// `quantity * unit_price`, rounded to cents.
    ///
    /// # Errors
    ///
    /// Returns [`CostingError::Overflow`] past the decimal range.
    pub fn value(&self) -> Result<Decimal, CostingError> {
        Decimal::from(self.quantity)
            .checked_mul(self.unit_price)
            .map(round_money)
            .ok_or(CostingError::Overflow("line value"))
    }
}

/// Before/after cost figures for one received line.
///
/// Returned to callers as the `formulas` block of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostFormula {
    pub part_id: PartId,
    pub part_no: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub line_value: Decimal,
    pub expense_share: Decimal,
    pub expense_per_unit: Decimal,
    pub landed_cost: Decimal,
    pub old_quantity: i64,
    pub old_cost: Decimal,
    pub new_quantity: i64,
    pub new_cost: Decimal,
    pub method: CostingMethod,
}

/// Outcome of costing a whole receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptCosting {
    /// One formula per line, in line order.
    pub formulas: Vec<CostFormula>,
    /// Sum of line values.
    pub items_total: Decimal,
    /// Sum of expense amounts.
    pub expense_total: Decimal,
    /// Final cost per part, in first-seen order.
    pub new_costs: Vec<(PartId, Decimal)>,
}

impl ReceiptCosting {
    /// Amount capitalised into inventory. Checked for overflow while costing.
    #[must_use]
    pub fn inventory_total(&self) -> Decimal {
        self.items_total + self.expense_total
    }
}

fn checked_sum(amounts: &[Decimal], what: &'static str) -> Result<Decimal, CostingError> {
    amounts
        .iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(*a))
        .ok_or(CostingError::Overflow(what))
}

/// Costs a receipt.
///
/// Expenses are spread over the lines by value, each line's landed cost is
/// the unit price plus its per-unit share, and the part cost moves according
/// to `method`. Several lines for the same part fold in order, each one
/// seeing the quantity and cost left by the previous. Negative stock on
/// hand counts as zero when averaging.
///
/// # Errors
///
/// - [`CostingError::Validation`] for non-positive quantities or negative amounts.
/// - [`CostingError::PartNotFound`] when a line has no snapshot.
pub fn plan_receipt_costs(
    lines: &[ReceiptLine],
    expenses: &[Decimal],
    snapshots: &HashMap<PartId, PartSnapshot>,
    method: CostingMethod,
) -> Result<ReceiptCosting, CostingError> {
    for line in lines {
        if line.quantity <= 0 {
            return Err(CostingError::not_positive("quantity"));
        }
        ensure_amount("unit_price", line.unit_price)?;
        if !snapshots.contains_key(&line.part_id) {
            return Err(CostingError::PartNotFound(line.part_id));
        }
    }
    for expense in expenses {
        ensure_amount("expense_amount", *expense)?;
    }

    let expense_total = round_money(checked_sum(expenses, "expense total")?);
    let values = lines
        .iter()
        .map(ReceiptLine::value)
        .collect::<Result<Vec<_>, _>>()?;
    let items_total = checked_sum(&values, "items total")?;
    items_total
        .checked_add(expense_total)
        .ok_or(CostingError::Overflow("inventory total"))?;
    let shares = distribute_expenses_by_value(&values, expense_total)?;

    let mut running: HashMap<PartId, (i64, Decimal)> = HashMap::new();
    let mut order: Vec<PartId> = Vec::new();
    let mut formulas = Vec::with_capacity(lines.len());

    for ((line, value), share) in lines.iter().zip(values).zip(shares) {
        let snapshot = snapshots
            .get(&line.part_id)
            .ok_or(CostingError::PartNotFound(line.part_id))?;

        let (old_quantity, old_cost) = *running.entry(line.part_id).or_insert_with(|| {
            order.push(line.part_id);
            (snapshot.on_hand.max(0), snapshot.cost)
        });

        let expense_per_unit = round_cost(share / Decimal::from(line.quantity));
        let landed_cost = calculate_landed_cost(line.unit_price, expense_per_unit)?;
        let new_cost = match method {
            CostingMethod::WeightedAverage => {
                calculate_average_cost(old_quantity, old_cost, line.quantity, landed_cost)?
            }
            CostingMethod::LastLanded => landed_cost,
        };
        let new_quantity = old_quantity
            .checked_add(line.quantity)
            .ok_or(CostingError::Overflow("received quantity"))?;

        running.insert(line.part_id, (new_quantity, new_cost));
        formulas.push(CostFormula {
            part_id: line.part_id,
            part_no: snapshot.part_no.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_value: value,
            expense_share: share,
            expense_per_unit,
            landed_cost,
            old_quantity,
            old_cost,
            new_quantity,
            new_cost,
            method,
        });
    }

    let new_costs = order
        .into_iter()
        .filter_map(|id| running.get(&id).map(|(_, cost)| (id, *cost)))
        .collect();

    Ok(ReceiptCosting {
        formulas,
        items_total,
        expense_total,
        new_costs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(part_id: PartId, part_no: &str, cost: Decimal, on_hand: i64) -> PartSnapshot {
        PartSnapshot {
            part_id,
            part_no: part_no.to_string(),
            cost,
            on_hand,
        }
    }

    fn snapshots(list: Vec<PartSnapshot>) -> HashMap<PartId, PartSnapshot> {
        list.into_iter().map(|s| (s.part_id, s)).collect()
    }

    #[test]
    fn test_landed_cost_with_expense_split_by_value() {
        let a = PartId::new();
        let b = PartId::new();
        let snaps = snapshots(vec![
            snapshot(a, "A-1", dec!(0), 0),
            snapshot(b, "B-1", dec!(0), 0),
        ]);
        // Values 800 and 200 share a 200 expense as 160 and 40.
        let lines = [
            ReceiptLine { part_id: a, quantity: 8, unit_price: dec!(100) },
            ReceiptLine { part_id: b, quantity: 2, unit_price: dec!(100) },
        ];

        let costing =
            plan_receipt_costs(&lines, &[dec!(150), dec!(50)], &snaps, CostingMethod::WeightedAverage)
                .unwrap();

        assert_eq!(costing.items_total, dec!(1000));
        assert_eq!(costing.expense_total, dec!(200));
        assert_eq!(costing.inventory_total(), dec!(1200));

        let f = &costing.formulas[0];
        assert_eq!(f.expense_share, dec!(160));
        assert_eq!(f.expense_per_unit, dec!(20));
        assert_eq!(f.landed_cost, dec!(120));
        assert_eq!(f.new_cost, dec!(120));

        let f = &costing.formulas[1];
        assert_eq!(f.expense_share, dec!(40));
        assert_eq!(f.landed_cost, dec!(120));
    }

    #[test]
    fn test_weighted_average_against_stock_on_hand() {
        let a = PartId::new();
        let snaps = snapshots(vec![snapshot(a, "A-1", dec!(100), 10)]);
        let lines = [ReceiptLine { part_id: a, quantity: 5, unit_price: dec!(160) }];

        let costing =
            plan_receipt_costs(&lines, &[], &snaps, CostingMethod::WeightedAverage).unwrap();

        let f = &costing.formulas[0];
        assert_eq!(f.old_quantity, 10);
        assert_eq!(f.new_quantity, 15);
        assert_eq!(f.new_cost, dec!(120));
        assert_eq!(costing.new_costs, vec![(a, dec!(120))]);
    }

    #[test]
    fn test_last_landed_replaces_cost() {
        let a = PartId::new();
        let snaps = snapshots(vec![snapshot(a, "A-1", dec!(100), 10)]);
        let lines = [ReceiptLine { part_id: a, quantity: 5, unit_price: dec!(160) }];

        let costing = plan_receipt_costs(&lines, &[], &snaps, CostingMethod::LastLanded).unwrap();
        assert_eq!(costing.new_costs, vec![(a, dec!(160))]);
    }

    #[test]
    fn test_repeated_part_folds_in_line_order() {
        let a = PartId::new();
        let snaps = snapshots(vec![snapshot(a, "A-1", dec!(100), 10)]);
        let lines = [
            ReceiptLine { part_id: a, quantity: 5, unit_price: dec!(160) },
            ReceiptLine { part_id: a, quantity: 5, unit_price: dec!(200) },
        ];

        let costing =
            plan_receipt_costs(&lines, &[], &snaps, CostingMethod::WeightedAverage).unwrap();

        // (15 * 120 + 5 * 200) / 20 = 140
        assert_eq!(costing.formulas[1].old_quantity, 15);
        assert_eq!(costing.formulas[1].old_cost, dec!(120));
        assert_eq!(costing.new_costs, vec![(a, dec!(140))]);
    }

    #[test]
    fn test_negative_on_hand_counts_as_zero() {
        let a = PartId::new();
        let snaps = snapshots(vec![snapshot(a, "A-1", dec!(100), -4)]);
        let lines = [ReceiptLine { part_id: a, quantity: 2, unit_price: dec!(50) }];

        let costing =
            plan_receipt_costs(&lines, &[], &snaps, CostingMethod::WeightedAverage).unwrap();
        assert_eq!(costing.formulas[0].old_quantity, 0);
        assert_eq!(costing.new_costs, vec![(a, dec!(50))]);
    }

    #[test]
    fn test_rejects_zero_quantity_and_missing_part() {
        let a = PartId::new();
        let snaps = snapshots(vec![snapshot(a, "A-1", dec!(1), 0)]);

        let zero = [ReceiptLine { part_id: a, quantity: 0, unit_price: dec!(1) }];
        assert_eq!(
            plan_receipt_costs(&zero, &[], &snaps, CostingMethod::default()),
            Err(CostingError::not_positive("quantity"))
        );

        let missing = PartId::new();
        let lines = [ReceiptLine { part_id: missing, quantity: 1, unit_price: dec!(1) }];
        assert_eq!(
            plan_receipt_costs(&lines, &[], &snaps, CostingMethod::default()),
            Err(CostingError::PartNotFound(missing))
        );
    }

    #[test]
    fn test_rejects_negative_expense() {
        let a = PartId::new();
        let snaps = snapshots(vec![snapshot(a, "A-1", dec!(1), 0)]);
        let lines = [ReceiptLine { part_id: a, quantity: 1, unit_price: dec!(1) }];
        assert!(matches!(
            plan_receipt_costs(&lines, &[dec!(-3)], &snaps, CostingMethod::default()),
            Err(CostingError::Validation { field: "expense_amount", .. })
        ));
    }

    #[test]
    fn test_oversized_line_value_is_an_overflow() {
        let a = PartId::new();
        let snaps = snapshots(vec![snapshot(a, "A-1", dec!(1), 0)]);
        let lines = [ReceiptLine { part_id: a, quantity: i64::MAX, unit_price: Decimal::MAX }];
        assert_eq!(
            plan_receipt_costs(&lines, &[], &snaps, CostingMethod::default()),
            Err(CostingError::Overflow("line value"))
        );
    }

    #[test]
    fn test_formula_serializes() {
        let a = PartId::new();
        let snaps = snapshots(vec![snapshot(a, "A-1", dec!(1), 0)]);
        let lines = [ReceiptLine { part_id: a, quantity: 1, unit_price: dec!(2.5) }];
        let costing = plan_receipt_costs(&lines, &[], &snaps, CostingMethod::default()).unwrap();

        let json = serde_json::to_value(&costing.formulas[0]).unwrap();
        assert_eq!(json["part_no"], "A-1");
        assert_eq!(json["method"], "weighted_average");
    }
}

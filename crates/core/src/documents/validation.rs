//! Line checks run before document lines are stored.

use rust_decimal::Decimal;

use super::error::DocumentError;
use super::invoice::InvoiceItem;
use super::purchase::{PurchaseExpense, PurchaseItem};
use crate::costing::{COST_SCALE, MONEY_SCALE};

fn check_quantity(quantity: i64) -> Result<(), DocumentError> {
    if quantity <= 0 {
        return Err(DocumentError::Validation {
            field: "quantity",
            reason: "must be greater than zero",
        });
    }
    Ok(())
}

fn check_amount(field: &'static str, amount: Decimal, scale: u32) -> Result<(), DocumentError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(DocumentError::Validation {
            field,
            reason: "must not be negative",
        });
    }
    if amount.normalize().scale() > scale {
        return Err(DocumentError::Validation {
            field,
            reason: "has too many decimal places",
        });
    }
    Ok(())
}

/// Checks purchase items and expenses.
///
/// Unit prices keep [`COST_SCALE`] decimals, expenses [`MONEY_SCALE`].
///
/// # Errors
///
/// Returns [`DocumentError::Validation`] for a non-positive quantity, a
/// negative amount or an amount with more decimals than it keeps.
pub fn validate_purchase_lines(
    items: &[PurchaseItem],
    expenses: &[PurchaseExpense],
) -> Result<(), DocumentError> {
    for item in items {
        check_quantity(item.quantity)?;
        check_amount("unit_price", item.unit_price, COST_SCALE)?;
    }
    for expense in expenses {
        check_amount("expense_amount", expense.amount, MONEY_SCALE)?;
    }
    Ok(())
}

/// Checks invoice items. Selling prices keep [`MONEY_SCALE`] decimals.
///
/// # Errors
///
/// Returns [`DocumentError::Validation`] as [`validate_purchase_lines`].
pub fn validate_invoice_items(items: &[InvoiceItem]) -> Result<(), DocumentError> {
    for item in items {
        check_quantity(item.quantity)?;
        check_amount("unit_price", item.unit_price, MONEY_SCALE)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use inventra_shared::types::PartId;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn item(quantity: i64, unit_price: Decimal) -> PurchaseItem {
        PurchaseItem {
            part_id: PartId::new(),
            quantity,
            unit_price,
            store_id: None,
        }
    }

    #[rstest]
    #[case(0, dec!(5), "quantity")]
    #[case(-2, dec!(5), "quantity")]
    #[case(1, dec!(-5), "unit_price")]
    #[case(1, dec!(1.23456), "unit_price")]
    fn test_bad_purchase_item(#[case] quantity: i64, #[case] price: Decimal, #[case] field: &str) {
        let err = validate_purchase_lines(&[item(quantity, price)], &[]).unwrap_err();
        assert!(matches!(err, DocumentError::Validation { field: f, .. } if f == field));
    }

    #[test]
    fn test_purchase_lines_accept_cost_precision() {
        let expense = PurchaseExpense {
            label: "Freight".to_string(),
            amount: dec!(12.50),
        };
        assert!(validate_purchase_lines(&[item(3, dec!(1.2345))], &[expense]).is_ok());
    }

    #[test]
    fn test_bad_expense_amount() {
        for amount in [dec!(-1), dec!(0.001)] {
            let expense = PurchaseExpense {
                label: "Duty".to_string(),
                amount,
            };
            assert!(matches!(
                validate_purchase_lines(&[item(1, dec!(1))], &[expense]),
                Err(DocumentError::Validation { field: "expense_amount", .. })
            ));
        }
    }

    #[test]
    fn test_invoice_price_keeps_cents() {
        let line = |unit_price| InvoiceItem {
            part_id: PartId::new(),
            quantity: 1,
            unit_price,
            store_id: None,
        };
        assert!(validate_invoice_items(&[line(dec!(19.99))]).is_ok());
        assert!(validate_invoice_items(&[line(dec!(19.995))]).is_err());
        assert!(validate_invoice_items(&[InvoiceItem { quantity: 0, ..line(dec!(1)) }]).is_err());
    }
}

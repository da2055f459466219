//! Line validation for ledger entries.

use rust_decimal::Decimal;

use super::error::LedgerError;
use crate::costing::MONEY_SCALE;
use super::types::{EntryInput, EntryKind, EntryTotals, LineInput};

/// Validates the lines of an entry and returns their totals.
///
/// Rules, in order:
/// 1. at least two lines
/// 2. no negative amounts
/// 3. at most [`MONEY_SCALE`] significant decimal places per amount
/// 4. no line with both sides, no line with neither
/// 5. at least one debit and one credit
/// 6. total debit equals total credit exactly
pub fn validate_lines(lines: &[LineInput]) -> Result<EntryTotals, LedgerError> {
    if lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    let mut debit = Decimal::ZERO;
    let mut credit = Decimal::ZERO;
    let mut has_debit = false;
    let mut has_credit = false;

    for line in lines {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount);
        }
        for amount in [line.debit, line.credit] {
            if amount.normalize().scale() > MONEY_SCALE {
                return Err(LedgerError::ExcessPrecision(amount));
            }
        }
        match (line.debit.is_zero(), line.credit.is_zero()) {
            (false, false) => return Err(LedgerError::BothSides),
            (true, true) => return Err(LedgerError::ZeroAmount),
            (false, true) => {
                debit = debit.checked_add(line.debit).ok_or(LedgerError::TotalOverflow)?;
                has_debit = true;
            }
            (true, false) => {
                credit = credit.checked_add(line.credit).ok_or(LedgerError::TotalOverflow)?;
                has_credit = true;
            }
        }
    }

    if !has_debit || !has_credit {
        return Err(LedgerError::SingleSided);
    }

    let totals = EntryTotals::new(debit, credit);
    if !totals.is_balanced {
        return Err(LedgerError::Unbalanced { debit, credit });
    }

    Ok(totals)
}

/// Validates an entry header together with its lines.
pub fn validate_entry(input: &EntryInput) -> Result<EntryTotals, LedgerError> {
    match (input.kind, input.voucher_type) {
        (EntryKind::Voucher, None) | (EntryKind::Journal, Some(_)) => {
            return Err(LedgerError::VoucherTypeMismatch);
        }
        _ => {}
    }
    validate_lines(&input.lines)
}

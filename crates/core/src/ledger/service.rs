//! Ledger service: validation and balance planning before persistence.

use inventra_shared::types::AccountId;

use super::balance::{BalanceDelta, posting_deltas};
use super::error::LedgerError;
use super::types::{AccountInfo, EntryInput, EntryTotals};

/// A validated entry and the balance increments posting it will apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedPosting {
    pub totals: EntryTotals,
    pub deltas: Vec<BalanceDelta>,
}

/// Ledger service.
///
/// Pure business logic; the caller supplies account lookups and persists
/// the result inside its own transaction.
pub struct LedgerService;

impl LedgerService {
    /// Validates an entry and computes its balance increments.
    ///
    /// 1. header and line rules (see [`super::validate_entry`])
    /// 2. every account exists and is active
    /// 3. per-account increments signed by normal balance
    pub fn prepare_posting<A>(
        input: &EntryInput,
        account_lookup: A,
    ) -> Result<PreparedPosting, LedgerError>
    where
        A: Fn(AccountId) -> Result<AccountInfo, LedgerError>,
    {
        let totals = super::validate_entry(input)?;

        let active_lookup = |id: AccountId| {
            let account = account_lookup(id)?;
            if !account.is_active {
                return Err(LedgerError::AccountInactive(id));
            }
            Ok(account)
        };
        let deltas = posting_deltas(&input.lines, active_lookup)?;

        Ok(PreparedPosting { totals, deltas })
    }

    /// Validates a draft without touching balances.
    ///
    /// Drafts may reference inactive accounts; the check happens on posting.
    pub fn validate_draft<A>(input: &EntryInput, account_lookup: A) -> Result<EntryTotals, LedgerError>
    where
        A: Fn(AccountId) -> Result<AccountInfo, LedgerError>,
    {
        let totals = super::validate_entry(input)?;
        for line in &input.lines {
            account_lookup(line.account_id)?;
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{AccountType, EntryKind, LineInput, VoucherType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct Fixture {
        cash: AccountId,
        expense: AccountId,
        accounts: HashMap<AccountId, AccountInfo>,
    }

    impl Fixture {
        fn new() -> Self {
            let cash = AccountId::new();
            let expense = AccountId::new();
            let accounts = [
                (cash, "1000", AccountType::Asset),
                (expense, "6000", AccountType::Expense),
            ]
            .into_iter()
            .map(|(id, code, account_type)| {
                (
                    id,
                    AccountInfo {
                        id,
                        code: code.to_string(),
                        account_type,
                        is_active: true,
                    },
                )
            })
            .collect();
            Self { cash, expense, accounts }
        }

        fn lookup(&self) -> impl Fn(AccountId) -> Result<AccountInfo, LedgerError> + '_ {
            move |id| self.accounts.get(&id).cloned().ok_or(LedgerError::AccountNotFound(id))
        }

        fn payment(&self, amount: rust_decimal::Decimal) -> EntryInput {
            EntryInput {
                kind: EntryKind::Voucher,
                voucher_type: Some(VoucherType::Payment),
                entry_date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                description: "Shop rent".to_string(),
                reference: None,
                lines: vec![
                    LineInput::debit(self.expense, amount),
                    LineInput::credit(self.cash, amount),
                ],
            }
        }
    }

    #[test]
    fn test_prepare_payment_voucher() {
        let fx = Fixture::new();
        let prepared = LedgerService::prepare_posting(&fx.payment(dec!(500)), fx.lookup()).unwrap();

        assert_eq!(prepared.totals.debit, dec!(500));
        assert_eq!(
            prepared.deltas,
            vec![
                BalanceDelta { account_id: fx.expense, delta: dec!(500) },
                BalanceDelta { account_id: fx.cash, delta: dec!(-500) },
            ]
        );
    }

    #[test]
    fn test_inactive_account_blocks_posting_not_draft() {
        let mut fx = Fixture::new();
        if let Some(cash) = fx.accounts.get_mut(&fx.cash) {
            cash.is_active = false;
        }
        let input = fx.payment(dec!(10));

        assert_eq!(
            LedgerService::prepare_posting(&input, fx.lookup()),
            Err(LedgerError::AccountInactive(fx.cash))
        );
        assert!(LedgerService::validate_draft(&input, fx.lookup()).is_ok());
    }

    #[test]
    fn test_unbalanced_rejected_before_lookup() {
        let fx = Fixture::new();
        let mut input = fx.payment(dec!(10));
        input.lines[1].credit = dec!(9);

        let result = LedgerService::prepare_posting(&input, |_| -> Result<AccountInfo, LedgerError> {
            panic!("lookup must not run for an unbalanced entry")
        });
        assert_eq!(
            result,
            Err(LedgerError::Unbalanced { debit: dec!(10), credit: dec!(9) })
        );
    }
}

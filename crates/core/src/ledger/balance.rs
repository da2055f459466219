//! Account balance deltas.
//!
//! Posting turns lines into one increment per account, reversing negates
//! those increments. Because every change is an increment, the final
//! balance does not depend on the order entries are posted in.

use rust_decimal::Decimal;
use serde::Serialize;
use inventra_shared::types::AccountId;

use super::error::LedgerError;
use super::types::{AccountInfo, AccountType, LineInput};

/// Increment to apply to one account's cached balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceDelta {
    pub account_id: AccountId,
    pub delta: Decimal,
}

/// Per-account balance changes for a set of lines.
///
/// Lines on the same account are merged. Accounts appear in order of first
/// use; accounts whose lines cancel out are dropped.
pub fn posting_deltas<A>(lines: &[LineInput], account_lookup: A) -> Result<Vec<BalanceDelta>, LedgerError>
where
    A: Fn(AccountId) -> Result<AccountInfo, LedgerError>,
{
    let mut deltas: Vec<BalanceDelta> = Vec::new();
    for line in lines {
        let account = account_lookup(line.account_id)?;
        let change = account
            .account_type
            .normal_balance()
            .balance_change(line.debit, line.credit);

        match deltas.iter_mut().find(|d| d.account_id == line.account_id) {
            Some(existing) => existing.delta += change,
            None => deltas.push(BalanceDelta {
                account_id: line.account_id,
                delta: change,
            }),
        }
    }
    deltas.retain(|d| !d.delta.is_zero());
    Ok(deltas)
}

/// The increments that undo `deltas`.
#[must_use]
pub fn reversal_deltas(deltas: &[BalanceDelta]) -> Vec<BalanceDelta> {
    deltas
        .iter()
        .map(|d| BalanceDelta {
            account_id: d.account_id,
            delta: -d.delta,
        })
        .collect()
}

/// `opening_balance` plus the signed effect of `(debit, credit)` pairs.
#[must_use]
pub fn recompute_balance<I>(account_type: AccountType, opening_balance: Decimal, lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    let normal = account_type.normal_balance();
    lines
        .into_iter()
        .fold(opening_balance, |balance, (debit, credit)| {
            balance + normal.balance_change(debit, credit)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn chart(types: &[AccountType]) -> HashMap<AccountId, AccountInfo> {
        types
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let id = AccountId::new();
                (
                    id,
                    AccountInfo {
                        id,
                        code: format!("{}", 1000 + i),
                        account_type: *t,
                        is_active: true,
                    },
                )
            })
            .collect()
    }

    fn lookup(
        chart: &HashMap<AccountId, AccountInfo>,
    ) -> impl Fn(AccountId) -> Result<AccountInfo, LedgerError> + '_ {
        move |id| chart.get(&id).cloned().ok_or(LedgerError::AccountNotFound(id))
    }

    fn apply(balances: &mut HashMap<AccountId, Decimal>, deltas: &[BalanceDelta]) {
        for d in deltas {
            *balances.entry(d.account_id).or_insert(Decimal::ZERO) += d.delta;
        }
    }

    #[test]
    fn test_inventory_purchase_deltas() {
        let inventory = AccountId::new();
        let payable = AccountId::new();
        let accounts: HashMap<AccountId, AccountInfo> = [
            (inventory, AccountType::Asset),
            (payable, AccountType::Liability),
        ]
        .into_iter()
        .map(|(id, t)| {
            (
                id,
                AccountInfo {
                    id,
                    code: String::new(),
                    account_type: t,
                    is_active: true,
                },
            )
        })
        .collect();

        let lines = vec![
            LineInput::debit(inventory, dec!(1200)),
            LineInput::credit(payable, dec!(1200)),
        ];
        let deltas = posting_deltas(&lines, lookup(&accounts)).unwrap();

        // Both sides increase: the asset grows and so does the liability.
        assert_eq!(
            deltas,
            vec![
                BalanceDelta { account_id: inventory, delta: dec!(1200) },
                BalanceDelta { account_id: payable, delta: dec!(1200) },
            ]
        );
    }

    #[test]
    fn test_cost_account_is_debit_normal() {
        let accounts = chart(&[AccountType::Cost, AccountType::Asset]);
        let ids: Vec<AccountId> = accounts.keys().copied().collect();
        let cost = ids.iter().copied().find(|id| accounts[id].account_type == AccountType::Cost).unwrap();
        let asset = ids.iter().copied().find(|id| *id != cost).unwrap();

        let lines = vec![LineInput::debit(cost, dec!(80)), LineInput::credit(asset, dec!(80))];
        let deltas = posting_deltas(&lines, lookup(&accounts)).unwrap();

        let cost_delta = deltas.iter().find(|d| d.account_id == cost).unwrap();
        assert_eq!(cost_delta.delta, dec!(80));
    }

    #[test]
    fn test_same_account_lines_merge_and_cancel() {
        let accounts = chart(&[AccountType::Asset, AccountType::Asset]);
        let mut ids: Vec<AccountId> = accounts.keys().copied().collect();
        ids.sort_by_key(|id| id.into_inner());

        let lines = vec![
            LineInput::debit(ids[0], dec!(10)),
            LineInput::credit(ids[0], dec!(10)),
            LineInput::debit(ids[1], dec!(5)),
            LineInput::credit(ids[0], dec!(5)),
        ];
        let deltas = posting_deltas(&lines, lookup(&accounts)).unwrap();
        assert_eq!(
            deltas,
            vec![
                BalanceDelta { account_id: ids[0], delta: dec!(-5) },
                BalanceDelta { account_id: ids[1], delta: dec!(5) },
            ]
        );
    }

    #[test]
    fn test_unknown_account() {
        let missing = AccountId::new();
        let lines = vec![LineInput::debit(missing, dec!(1))];
        assert_eq!(
            posting_deltas(&lines, lookup(&HashMap::new())),
            Err(LedgerError::AccountNotFound(missing))
        );
    }

    #[test]
    fn test_recompute_balance() {
        let lines = [(dec!(100), dec!(0)), (dec!(0), dec!(30))];
        assert_eq!(recompute_balance(AccountType::Asset, dec!(50), lines), dec!(120));
        assert_eq!(recompute_balance(AccountType::Revenue, dec!(50), lines), dec!(-20));
    }

    fn account_type_strategy() -> impl Strategy<Value = AccountType> {
        prop_oneof![
            Just(AccountType::Asset),
            Just(AccountType::Liability),
            Just(AccountType::Equity),
            Just(AccountType::Revenue),
            Just(AccountType::Expense),
            Just(AccountType::Cost),
        ]
    }

    /// Entries as (debit account index, credit account index, amount in cents).
    fn entries_strategy() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
        prop::collection::vec((0usize..4, 0usize..4, 1i64..1_000_000), 1..15)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Final balances do not depend on posting order.
        #[test]
        fn prop_posting_order_commutes(
            types in prop::collection::vec(account_type_strategy(), 4),
            entries in entries_strategy(),
        ) {
            let accounts = chart(&types);
            let ids: Vec<AccountId> = accounts.keys().copied().collect();
            let all: Vec<Vec<BalanceDelta>> = entries
                .iter()
                .map(|(d, c, cents)| {
                    let amount = Decimal::new(*cents, 2);
                    let lines = vec![
                        LineInput::debit(ids[*d], amount),
                        LineInput::credit(ids[*c], amount),
                    ];
                    posting_deltas(&lines, lookup(&accounts)).unwrap()
                })
                .collect();

            let mut forward = HashMap::new();
            for deltas in &all {
                apply(&mut forward, deltas);
            }
            let mut backward = HashMap::new();
            for deltas in all.iter().rev() {
                apply(&mut backward, deltas);
            }

            for id in &ids {
                prop_assert_eq!(
                    forward.get(id).copied().unwrap_or_default(),
                    backward.get(id).copied().unwrap_or_default()
                );
            }
        }

        /// Posting then reversing restores every balance exactly.
        #[test]
        fn prop_post_then_reverse_restores(
            types in prop::collection::vec(account_type_strategy(), 4),
            openings in prop::collection::vec(-1_000_000i64..1_000_000, 4),
            entries in entries_strategy(),
        ) {
            let accounts = chart(&types);
            let ids: Vec<AccountId> = accounts.keys().copied().collect();
            let mut balances: HashMap<AccountId, Decimal> = ids
                .iter()
                .zip(openings.iter())
                .map(|(id, o)| (*id, Decimal::new(*o, 2)))
                .collect();
            let before = balances.clone();

            let lines: Vec<LineInput> = entries
                .iter()
                .flat_map(|(d, c, cents)| {
                    let amount = Decimal::new(*cents, 2);
                    [LineInput::debit(ids[*d], amount), LineInput::credit(ids[*c], amount)]
                })
                .collect();
            let deltas = posting_deltas(&lines, lookup(&accounts)).unwrap();

            apply(&mut balances, &deltas);
            apply(&mut balances, &reversal_deltas(&deltas));

            prop_assert_eq!(balances, before);
        }

        /// Cached increments agree with recomputation from lines.
        #[test]
        fn prop_increments_match_recompute(
            account_type in account_type_strategy(),
            opening in -1_000_000i64..1_000_000,
            lines in prop::collection::vec((0i64..100_000, any::<bool>()), 1..20),
        ) {
            let opening = Decimal::new(opening, 2);
            let pairs: Vec<(Decimal, Decimal)> = lines
                .iter()
                .map(|(cents, is_debit)| {
                    let amount = Decimal::new(*cents, 2);
                    if *is_debit { (amount, Decimal::ZERO) } else { (Decimal::ZERO, amount) }
                })
                .collect();

            let incremental = pairs.iter().fold(opening, |b, (d, c)| {
                b + account_type.normal_balance().balance_change(*d, *c)
            });
            prop_assert_eq!(incremental, recompute_balance(account_type, opening, pairs));
        }
    }
}

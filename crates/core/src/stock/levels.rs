//! Stock levels derived from movements.

use std::collections::{BTreeMap, HashMap, HashSet};

use inventra_shared::types::{PartId, StoreId};
use serde::Serialize;

use super::error::StockError;
use super::types::{DocumentRef, StockMovement};

/// Quantity on hand for one part in one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    pub part_id: PartId,
    pub store_id: Option<StoreId>,
    pub quantity: i64,
}

/// Quantity of `part_id` held in `store_id`.
#[must_use]
pub fn quantity_in_store<'a, I>(part_id: PartId, store_id: Option<StoreId>, movements: I) -> i64
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    movements
        .into_iter()
        .filter(|m| m.part_id == part_id && m.store_id == store_id)
        .map(StockMovement::signed_quantity)
        .sum()
}

/// On-hand quantity per part across all stores.
#[must_use]
pub fn on_hand_by_part<'a, I>(movements: I) -> HashMap<PartId, i64>
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    let mut totals = HashMap::new();
    for movement in movements {
        *totals.entry(movement.part_id).or_insert(0) += movement.signed_quantity();
    }
    totals
}

/// On-hand quantity per part and store, ordered by part then store.
#[must_use]
pub fn stock_levels<'a, I>(movements: I) -> Vec<StockLevel>
where
    I: IntoIterator<Item = &'a StockMovement>,
{
    let mut totals: BTreeMap<(PartId, Option<StoreId>), i64> = BTreeMap::new();
    for movement in movements {
        *totals
            .entry((movement.part_id, movement.store_id))
            .or_insert(0) += movement.signed_quantity();
    }

    totals
        .into_iter()
        .map(|((part_id, store_id), quantity)| StockLevel {
            part_id,
            store_id,
            quantity,
        })
        .collect()
}

/// Checks that every requested quantity can be issued from stock on hand.
///
/// Requests for the same part are summed before comparing.
pub fn check_availability(
    requests: &[(PartId, i64)],
    on_hand: &HashMap<PartId, i64>,
) -> Result<(), StockError> {
    let mut requested: Vec<(PartId, i64)> = Vec::new();
    for (part_id, quantity) in requests {
        if *quantity <= 0 {
            return Err(StockError::InvalidQuantity(*quantity));
        }
        match requested.iter_mut().find(|(id, _)| id == part_id) {
            Some((_, total)) => *total += quantity,
            None => requested.push((*part_id, *quantity)),
        }
    }

    for (part_id, quantity) in requested {
        let available = on_hand.get(&part_id).copied().unwrap_or(0);
        if quantity > available {
            return Err(StockError::InsufficientStock {
                part_id,
                requested: quantity,
                available,
            });
        }
    }

    Ok(())
}

/// Movements whose originating document is not in `existing`.
#[must_use]
pub fn find_orphans<K: Copy>(
    movements: &[(K, DocumentRef)],
    existing: &HashSet<DocumentRef>,
) -> Vec<K> {
    movements
        .iter()
        .filter(|(_, reference)| !existing.contains(reference))
        .map(|(key, _)| *key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::{MovementDirection, ReferenceType};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn movement(
        part_id: PartId,
        store_id: Option<StoreId>,
        direction: MovementDirection,
        quantity: i64,
    ) -> StockMovement {
        StockMovement::new(
            part_id,
            store_id,
            direction,
            quantity,
            DocumentRef::new(ReferenceType::Adjustment, Uuid::nil()),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_per_store_quantities() {
        let part = PartId::new();
        let main = Some(StoreId::new());
        let branch = Some(StoreId::new());
        let movements = vec![
            movement(part, main, MovementDirection::In, 10),
            movement(part, branch, MovementDirection::In, 4),
            movement(part, main, MovementDirection::Out, 3),
        ];

        assert_eq!(quantity_in_store(part, main, &movements), 7);
        assert_eq!(quantity_in_store(part, branch, &movements), 4);
        assert_eq!(quantity_in_store(part, None, &movements), 0);
        assert_eq!(on_hand_by_part(&movements)[&part], 11);
        assert_eq!(stock_levels(&movements).len(), 2);
    }

    #[test]
    fn test_check_availability_sums_requests() {
        let part = PartId::new();
        let on_hand = HashMap::from([(part, 5)]);

        assert!(check_availability(&[(part, 2), (part, 3)], &on_hand).is_ok());
        assert_eq!(
            check_availability(&[(part, 2), (part, 4)], &on_hand),
            Err(StockError::InsufficientStock {
                part_id: part,
                requested: 6,
                available: 5,
            })
        );
    }

    #[test]
    fn test_check_availability_unknown_part_has_nothing() {
        let part = PartId::new();
        assert!(matches!(
            check_availability(&[(part, 1)], &HashMap::new()),
            Err(StockError::InsufficientStock { available: 0, .. })
        ));
    }

    #[test]
    fn test_find_orphans() {
        let live = DocumentRef::new(ReferenceType::Purchase, Uuid::from_u128(1));
        let gone = DocumentRef::new(ReferenceType::Sale, Uuid::from_u128(2));
        let existing = HashSet::from([live]);

        let orphans = find_orphans(&[(1, live), (2, gone), (3, gone)], &existing);
        assert_eq!(orphans, vec![2, 3]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Per-store levels always add up to the part total.
        #[test]
        fn prop_store_levels_sum_to_part_total(
            entries in prop::collection::vec((0usize..3, any::<bool>(), 1i64..100), 0..30),
        ) {
            let part = PartId::new();
            let stores = [None, Some(StoreId::new()), Some(StoreId::new())];
            let movements: Vec<StockMovement> = entries
                .iter()
                .map(|(store, inbound, qty)| {
                    let direction = if *inbound { MovementDirection::In } else { MovementDirection::Out };
                    movement(part, stores[*store], direction, *qty)
                })
                .collect();

            let total: i64 = stock_levels(&movements).iter().map(|l| l.quantity).sum();
            prop_assert_eq!(total, on_hand_by_part(&movements).get(&part).copied().unwrap_or(0));
        }
    }
}

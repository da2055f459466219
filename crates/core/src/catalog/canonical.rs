//! Canonical part selection among rows sharing a part number.
//!
//! Ranking, highest first:
//! 1. most recent `cost_updated_at` (a missing timestamp ranks oldest)
//! 2. most recent `updated_at`
//! 3. earliest `created_at`
//! 4. smallest id, so the choice is total and repeatable

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::types::LegacyPart;

/// A row that can take part in canonical selection.
pub trait CanonicalCandidate {
    /// Part number shared by duplicates.
    fn part_no(&self) -> &str;
    /// When the cost was last written, if ever.
    fn cost_updated_at(&self) -> Option<DateTime<Utc>>;
    /// Last modification time.
    fn updated_at(&self) -> DateTime<Utc>;
    /// Creation time.
    fn created_at(&self) -> DateTime<Utc>;
    /// Row identifier.
    fn row_id(&self) -> Uuid;
}

impl CanonicalCandidate for LegacyPart {
    fn part_no(&self) -> &str {
        &self.part_no
    }

    fn cost_updated_at(&self) -> Option<DateTime<Utc>> {
        self.cost_updated_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn row_id(&self) -> Uuid {
        self.id.into_inner()
    }
}

/// Orders `a` before `b` when `a` is the better canonical candidate.
pub fn canonical_order<T: CanonicalCandidate>(a: &T, b: &T) -> Ordering {
    // `None < Some(_)` for Option, so reversing puts the newest first and
    // missing timestamps last.
    b.cost_updated_at()
        .cmp(&a.cost_updated_at())
        .then_with(|| b.updated_at().cmp(&a.updated_at()))
        .then_with(|| a.created_at().cmp(&b.created_at()))
        .then_with(|| a.row_id().cmp(&b.row_id()))
}

/// Picks the canonical row out of `rows`.
///
/// Rows are assumed to share one part number; the caller groups them.
pub fn select_canonical<T: CanonicalCandidate>(rows: &[T]) -> Option<&T> {
    rows.iter().min_by(|a, b| canonical_order(*a, *b))
}

/// Result of collapsing duplicate part rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsedParts<T> {
    /// One row per part number, ordered by part number.
    pub canonical: Vec<T>,
    /// Rows that lost to the canonical row of their part number.
    pub discarded: Vec<T>,
}

/// Groups rows by part number and keeps the canonical row of each group.
pub fn collapse_duplicates<T: CanonicalCandidate>(rows: Vec<T>) -> CollapsedParts<T> {
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.part_no().to_string()).or_default().push(row);
    }

    let mut collapsed = CollapsedParts {
        canonical: Vec::with_capacity(groups.len()),
        discarded: Vec::new(),
    };

    for (_, mut group) in groups {
        group.sort_by(canonical_order);
        let mut rows = group.into_iter();
        if let Some(winner) = rows.next() {
            collapsed.canonical.push(winner);
        }
        collapsed.discarded.extend(rows);
    }

    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::{CostSource, PriceTiers};
    use chrono::TimeZone;
    use inventra_shared::types::PartId;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn part(
        id: u128,
        part_no: &str,
        cost: Decimal,
        cost_updated_at: Option<DateTime<Utc>>,
        updated_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> LegacyPart {
        LegacyPart {
            id: PartId::from_uuid(Uuid::from_u128(id)),
            part_no: part_no.to_string(),
            description: String::new(),
            cost,
            cost_source: CostSource::Manual,
            cost_updated_at,
            prices: PriceTiers::default(),
            created_at,
            updated_at,
        }
    }

    #[test]
    fn test_most_recent_cost_update_wins() {
        let base = at(2023, 1, 1);
        let rows = vec![
            part(1, "6C0570", dec!(10), None, at(2024, 12, 1), base),
            part(2, "6C0570", dec!(20), Some(at(2024, 1, 1)), base, base),
            part(3, "6C0570", dec!(30), Some(at(2024, 6, 1)), base, base),
        ];
        let winner = select_canonical(&rows).unwrap();
        assert_eq!(winner.cost, dec!(30));
    }

    #[test]
    fn test_tie_broken_by_updated_then_created_then_id() {
        let cost_at = Some(at(2024, 6, 1));
        let rows = vec![
            part(1, "A", dec!(1), cost_at, at(2024, 6, 2), at(2023, 1, 1)),
            part(2, "A", dec!(2), cost_at, at(2024, 6, 3), at(2023, 1, 1)),
        ];
        assert_eq!(select_canonical(&rows).unwrap().cost, dec!(2));

        let rows = vec![
            part(1, "A", dec!(1), cost_at, at(2024, 6, 3), at(2023, 5, 1)),
            part(2, "A", dec!(2), cost_at, at(2024, 6, 3), at(2023, 1, 1)),
        ];
        assert_eq!(select_canonical(&rows).unwrap().cost, dec!(2));

        let rows = vec![
            part(9, "A", dec!(9), None, at(2024, 1, 1), at(2023, 1, 1)),
            part(4, "A", dec!(4), None, at(2024, 1, 1), at(2023, 1, 1)),
        ];
        assert_eq!(select_canonical(&rows).unwrap().cost, dec!(4));
    }

    #[test]
    fn test_selection_independent_of_input_order() {
        let base = at(2023, 1, 1);
        let mut rows = vec![
            part(1, "A", dec!(1), Some(at(2024, 2, 1)), base, base),
            part(2, "A", dec!(2), Some(at(2024, 3, 1)), base, base),
            part(3, "A", dec!(3), None, base, base),
        ];
        let first = select_canonical(&rows).unwrap().id;
        rows.reverse();
        assert_eq!(select_canonical(&rows).unwrap().id, first);
    }

    #[test]
    fn test_select_canonical_empty() {
        let rows: Vec<LegacyPart> = vec![];
        assert!(select_canonical(&rows).is_none());
    }

    #[test]
    fn test_collapse_duplicates() {
        let base = at(2023, 1, 1);
        let rows = vec![
            part(1, "B", dec!(1), None, base, base),
            part(2, "A", dec!(2), Some(at(2024, 1, 1)), base, base),
            part(3, "A", dec!(3), Some(at(2024, 6, 1)), base, base),
            part(4, "A", dec!(4), None, base, base),
        ];

        let collapsed = collapse_duplicates(rows);
        let canonical: Vec<_> = collapsed
            .canonical
            .iter()
            .map(|p| (p.part_no.as_str(), p.cost))
            .collect();
        assert_eq!(canonical, vec![("A", dec!(3)), ("B", dec!(1))]);

        let discarded: Vec<_> = collapsed.discarded.iter().map(|p| p.cost).collect();
        assert_eq!(discarded, vec![dec!(2), dec!(4)]);
    }
}

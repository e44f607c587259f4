//! Pure rollup plan computation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use uuid::Uuid;

/// A child transaction feeding a rollup, joined with its category's parent.
#[derive(Debug, Clone)]
pub struct ChildRow {
    /// Category the transaction belongs to.
    pub category_id: Uuid,
    /// Parent of that category, if any. Children without a parent cannot
    /// roll up and are counted as orphans.
    pub parent_id: Option<Uuid>,
    /// Transaction amount (non-negative).
    pub amount: Decimal,
}

/// An existing derived transaction at the level being recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedRow {
    /// Transaction ID.
    pub transaction_id: Uuid,
    /// Category the derived row belongs to.
    pub category_id: Uuid,
    /// Stored amount.
    pub amount: Decimal,
}

/// A derived row to create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollupUpsert {
    /// Parent category receiving the total.
    pub category_id: Uuid,
    /// New total, always positive.
    pub total: Decimal,
}

/// The changes needed to bring one derived level in sync with its children.
#[derive(Debug, Clone, Default)]
pub struct RollupPlan {
    /// Derived rows to create or update, keyed by category.
    pub upserts: Vec<RollupUpsert>,
    /// Existing derived rows to delete (zero or vanished totals).
    pub deletes: Vec<Uuid>,
    /// Number of children skipped because their category has no parent.
    pub orphaned: usize,
}

impl RollupPlan {
    /// True when the level is already in sync.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty()
    }
}

/// Computes the plan for one derived level.
///
/// Groups `children` by parent category, summing amounts. Parents with a
/// positive total are upserted; existing derived rows whose total is now
/// zero or absent are deleted. A zero-total derived row is never stored.
///
/// Children with no parent are silently skipped and reported via
/// [`RollupPlan::orphaned`]; the caller decides whether to log them.
#[must_use]
pub fn plan_level(children: &[ChildRow], existing: &[DerivedRow]) -> RollupPlan {
    // BTreeMap keeps the plan deterministic regardless of input order.
    let mut totals: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    let mut orphaned = 0;

    for child in children {
        match child.parent_id {
            Some(parent_id) => {
                *totals.entry(parent_id).or_insert(Decimal::ZERO) += child.amount;
            }
            None => orphaned += 1,
        }
    }

    let upserts: Vec<RollupUpsert> = totals
        .iter()
        .filter(|(_, total)| **total > Decimal::ZERO)
        .map(|(&category_id, &total)| RollupUpsert { category_id, total })
        .collect();

    let deletes: Vec<Uuid> = existing
        .iter()
        .filter(|row| {
            totals
                .get(&row.category_id)
                .is_none_or(|total| *total <= Decimal::ZERO)
        })
        .map(|row| row.transaction_id)
        .collect();

    RollupPlan {
        upserts,
        deletes,
        orphaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn child(parent: Option<Uuid>, amount: Decimal) -> ChildRow {
        ChildRow {
            category_id: Uuid::new_v4(),
            parent_id: parent,
            amount,
        }
    }

    /// Applies a plan to an existing derived set, simulating what the
    /// persistence layer does.
    fn apply(plan: &RollupPlan, existing: &[DerivedRow]) -> Vec<DerivedRow> {
        let mut result: Vec<DerivedRow> = existing
            .iter()
            .filter(|row| !plan.deletes.contains(&row.transaction_id))
            .cloned()
            .collect();

        for upsert in &plan.upserts {
            if let Some(row) = result.iter_mut().find(|r| r.category_id == upsert.category_id) {
                row.amount = upsert.total;
            } else {
                result.push(DerivedRow {
                    transaction_id: Uuid::new_v4(),
                    category_id: upsert.category_id,
                    amount: upsert.total,
                });
            }
        }

        result.sort_by_key(|r| r.category_id);
        result
    }

    #[test]
    fn test_sums_children_per_parent() {
        let parent = Uuid::new_v4();
        let children = vec![
            child(Some(parent), dec!(100)),
            child(Some(parent), dec!(200)),
        ];

        let plan = plan_level(&children, &[]);
        assert_eq!(plan.upserts.len(), 1);
        assert_eq!(plan.upserts[0].category_id, parent);
        assert_eq!(plan.upserts[0].total, dec!(300));
        assert!(plan.deletes.is_empty());
        assert_eq!(plan.orphaned, 0);
    }

    #[test]
    fn test_removing_children_shrinks_then_deletes() {
        let parent = Uuid::new_v4();
        let a = child(Some(parent), dec!(100));
        let b = child(Some(parent), dec!(200));

        let derived = apply(&plan_level(&[a.clone(), b.clone()], &[]), &[]);
        assert_eq!(derived[0].amount, dec!(300));

        // Delete A's transaction: total drops to 200.
        let derived = apply(&plan_level(&[b], &derived), &derived);
        assert_eq!(derived.len(), 1);
        assert_eq!(derived[0].amount, dec!(200));

        // Delete B's transaction too: the derived row is deleted entirely,
        // not kept with amount 0.
        let plan = plan_level(&[], &derived);
        assert_eq!(plan.deletes, vec![derived[0].transaction_id]);
        assert!(plan.upserts.is_empty());
        assert!(apply(&plan, &derived).is_empty());
    }

    #[test]
    fn test_idempotent_on_unchanged_children() {
        let parent_a = Uuid::new_v4();
        let parent_b = Uuid::new_v4();
        let children = vec![
            child(Some(parent_a), dec!(150)),
            child(Some(parent_a), dec!(50)),
            child(Some(parent_b), dec!(75)),
        ];

        let first = apply(&plan_level(&children, &[]), &[]);
        let second = apply(&plan_level(&children, &first), &first);

        // Same transaction IDs, same categories, same amounts: no drift,
        // no duplicate rows.
        assert_eq!(first, second);
    }

    #[test]
    fn test_orphaned_children_are_skipped() {
        let parent = Uuid::new_v4();
        let children = vec![child(None, dec!(999)), child(Some(parent), dec!(10))];

        let plan = plan_level(&children, &[]);
        assert_eq!(plan.orphaned, 1);
        assert_eq!(plan.upserts.len(), 1);
        assert_eq!(plan.upserts[0].total, dec!(10));
    }

    #[test]
    fn test_zero_amount_children_do_not_materialize_rows() {
        let parent = Uuid::new_v4();
        let children = vec![child(Some(parent), dec!(0)), child(Some(parent), dec!(0))];

        let plan = plan_level(&children, &[]);
        assert!(plan.upserts.is_empty());
    }

    #[test]
    fn test_stale_existing_row_is_deleted() {
        let live_parent = Uuid::new_v4();
        let stale = DerivedRow {
            transaction_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            amount: dec!(500),
        };

        let plan = plan_level(&[child(Some(live_parent), dec!(10))], &[stale.clone()]);
        assert_eq!(plan.deletes, vec![stale.transaction_id]);
    }

    fn amount_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Upsert totals account for exactly the non-orphaned child mass.
        #[test]
        fn prop_totals_conserve_child_mass(
            amounts in proptest::collection::vec(amount_strategy(), 1..20),
            parent_count in 1usize..4,
        ) {
            let parents: Vec<Uuid> = (0..parent_count).map(|_| Uuid::new_v4()).collect();
            let children: Vec<ChildRow> = amounts
                .iter()
                .enumerate()
                .map(|(i, &amount)| child(Some(parents[i % parent_count]), amount))
                .collect();

            let plan = plan_level(&children, &[]);
            let planned: Decimal = plan.upserts.iter().map(|u| u.total).sum();
            let expected: Decimal = amounts.iter().copied().sum();
            prop_assert_eq!(planned, expected);
        }

        /// A category is never both upserted and deleted in one plan.
        #[test]
        fn prop_upserts_and_deletes_disjoint(
            amounts in proptest::collection::vec(amount_strategy(), 0..10),
        ) {
            let parent = Uuid::new_v4();
            let children: Vec<ChildRow> =
                amounts.iter().map(|&a| child(Some(parent), a)).collect();
            let existing = vec![DerivedRow {
                transaction_id: Uuid::new_v4(),
                category_id: parent,
                amount: Decimal::ONE,
            }];

            let plan = plan_level(&children, &existing);
            let deleted_categories: Vec<Uuid> = existing
                .iter()
                .filter(|r| plan.deletes.contains(&r.transaction_id))
                .map(|r| r.category_id)
                .collect();
            for upsert in &plan.upserts {
                prop_assert!(!deleted_categories.contains(&upsert.category_id));
            }
        }
    }
}

//! Rollup engine: maintains derived level-2 and level-1 transactions.
//!
//! `recompute` is a pure function of the persisted level-3 rows for one
//! (year, kind) pair: it re-derives level 2 from level 3, then level 1
//! from level 2, upserting and deleting derived rows as needed. Callers
//! are responsible for serializing concurrent recomputations of the same
//! pair (see [`crate::lock::RollupLocks`]).

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use anggara_core::category::CategoryKind;
use anggara_core::rollup::{ChildRow, DerivedRow, RollupPlan, plan_level};

use crate::entities::{categories, transactions};

/// Error types for rollup operations.
#[derive(Debug, thiserror::Error)]
pub enum RollupError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Counts of derived-row changes from one recomputation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollupOutcome {
    /// Level-2 rows created or updated.
    pub level2_upserts: usize,
    /// Level-2 rows deleted.
    pub level2_deletes: usize,
    /// Level-1 rows created or updated.
    pub level1_upserts: usize,
    /// Level-1 rows deleted.
    pub level1_deletes: usize,
    /// Children skipped because their category has no parent.
    pub orphaned: usize,
}

/// Engine recomputing derived transaction rows.
#[derive(Clone)]
pub struct RollupEngine {
    db: DatabaseConnection,
}

impl RollupEngine {
    /// Creates a new engine.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recomputes level-2 then level-1 derived rows for one (year, kind)
    /// pair. Idempotent: running it twice on unchanged level-3 data is a
    /// no-op the second time.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::Database`] if any read or write fails; the
    /// derived state may then be partially updated, which the next
    /// recomputation repairs.
    pub async fn recompute(
        &self,
        year_id: Uuid,
        kind: CategoryKind,
    ) -> Result<RollupOutcome, RollupError> {
        let mut outcome = RollupOutcome::default();

        // Level 3 -> level 2.
        let children = self.child_rows(year_id, kind, 3).await?;
        let existing = self.derived_rows(year_id, kind, 2).await?;
        let plan = plan_level(&children, &existing);
        outcome.level2_upserts = plan.upserts.len();
        outcome.level2_deletes = plan.deletes.len();
        outcome.orphaned += plan.orphaned;
        self.apply_plan(year_id, &plan).await?;

        // Level 2 -> level 1, over the rows just written.
        let children = self.child_rows(year_id, kind, 2).await?;
        let existing = self.derived_rows(year_id, kind, 1).await?;
        let plan = plan_level(&children, &existing);
        outcome.level1_upserts = plan.upserts.len();
        outcome.level1_deletes = plan.deletes.len();
        outcome.orphaned += plan.orphaned;
        self.apply_plan(year_id, &plan).await?;

        if outcome.orphaned > 0 {
            tracing::warn!(
                %year_id,
                %kind,
                orphaned = outcome.orphaned,
                "skipped transactions under parentless categories during rollup"
            );
        }

        Ok(outcome)
    }

    /// Fetches the year's transactions at `level` joined with their
    /// category, carrying the category's parent for grouping.
    async fn child_rows(
        &self,
        year_id: Uuid,
        kind: CategoryKind,
        level: i16,
    ) -> Result<Vec<ChildRow>, RollupError> {
        let rows = transactions::Entity::find()
            .find_also_related(categories::Entity)
            .filter(transactions::Column::YearId.eq(year_id))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::Level.eq(level))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(tx, category)| {
                category.map(|c| ChildRow {
                    category_id: tx.category_id,
                    parent_id: c.parent_id,
                    amount: tx.amount,
                })
            })
            .collect())
    }

    /// Fetches the existing derived rows at `level` for the pair.
    async fn derived_rows(
        &self,
        year_id: Uuid,
        kind: CategoryKind,
        level: i16,
    ) -> Result<Vec<DerivedRow>, RollupError> {
        let rows = transactions::Entity::find()
            .find_also_related(categories::Entity)
            .filter(transactions::Column::YearId.eq(year_id))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::Level.eq(level))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(tx, _)| DerivedRow {
                transaction_id: tx.id,
                category_id: tx.category_id,
                amount: tx.amount,
            })
            .collect())
    }

    /// Applies one level's plan: upserts keyed by (year, category), then
    /// deletes.
    async fn apply_plan(&self, year_id: Uuid, plan: &RollupPlan) -> Result<(), RollupError> {
        for upsert in &plan.upserts {
            let existing = transactions::Entity::find()
                .filter(transactions::Column::YearId.eq(year_id))
                .filter(transactions::Column::CategoryId.eq(upsert.category_id))
                .one(&self.db)
                .await?;

            match existing {
                Some(row) if row.amount == upsert.total => {}
                Some(row) => {
                    let mut active: transactions::ActiveModel = row.into();
                    active.amount = Set(upsert.total);
                    active.updated_at = Set(Utc::now().into());
                    active.update(&self.db).await?;
                }
                None => {
                    let now = Utc::now().into();
                    let model = transactions::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        year_id: Set(year_id),
                        category_id: Set(upsert.category_id),
                        amount: Set(upsert.total),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    model.insert(&self.db).await?;
                }
            }
        }

        if !plan.deletes.is_empty() {
            transactions::Entity::delete_many()
                .filter(transactions::Column::Id.is_in(plan.deletes.clone()))
                .exec(&self.db)
                .await?;
        }

        Ok(())
    }
}

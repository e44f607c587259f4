//! Transaction service: manual level-3 writes and derived-state upkeep.
//!
//! All client-facing transaction mutations land here. Each write follows
//! the same sequence: validate, persist the level-3 row, then (under the
//! per-(year, kind) lock) rebuild derived rows and the year summary, and
//! finally flush the query cache. Rollup or summary failures after a
//! successful write are logged and swallowed: the caller still sees
//! success, and the `ensure_all` maintenance operation repairs any stale
//! derived state later.

use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use anggara_core::category::{CategoryKind, MANUAL_LEVEL};

use crate::cache::QueryCache;
use crate::entities::{budget_years, categories, transactions};
use crate::lock::RollupLocks;
use crate::repositories::rollup::RollupEngine;
use crate::repositories::summary::SummaryEngine;

/// Error types for transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Negative amount.
    #[error("amount cannot be negative: {0}")]
    InvalidAmount(Decimal),

    /// Referenced budget year not found.
    #[error("budget year not found: {0}")]
    YearNotFound(Uuid),

    /// Referenced category not found.
    #[error("category not found: {0}")]
    CategoryNotFound(Uuid),

    /// Transaction not found.
    #[error("transaction not found: {0}")]
    NotFound(Uuid),

    /// Manual writes are restricted to level-3 categories.
    #[error("only level {MANUAL_LEVEL} categories accept manual transactions, got level {0}")]
    NotManualLevel(i16),

    /// A transaction already exists for this (year, category) pair.
    #[error("a transaction already exists for this year and category")]
    Duplicate,

    /// Stored kind column does not parse. Indicates corrupt data.
    #[error("unrecognized category kind: {0}")]
    InvalidKind(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    /// Budget year.
    pub year_id: Uuid,
    /// Level-3 category.
    pub category_id: Uuid,
    /// Non-negative amount.
    pub amount: Decimal,
}

/// Input for updating a transaction. Unset fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionInput {
    /// New budget year.
    pub year_id: Option<Uuid>,
    /// New level-3 category.
    pub category_id: Option<Uuid>,
    /// New amount.
    pub amount: Option<Decimal>,
}

/// Filter for listing transactions.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Restrict to one budget year.
    pub year_id: Option<Uuid>,
    /// Restrict to one category.
    pub category_id: Option<Uuid>,
    /// Restrict to one category kind.
    pub kind: Option<CategoryKind>,
    /// Restrict to one category level.
    pub level: Option<i16>,
}

/// Result of a bulk create.
#[derive(Debug, Clone, Copy)]
pub struct BulkCreateOutcome {
    /// Rows inserted.
    pub created: usize,
    /// Rollup+summary cycles run: one per distinct (year, kind) pair,
    /// not one per row.
    pub rollup_cycles: usize,
}

/// Result of the `ensure_all` maintenance operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsureOutcome {
    /// Distinct years refreshed.
    pub years: usize,
    /// Rollup+summary cycles run.
    pub cycles: usize,
}

/// Repository orchestrating transaction writes and derived-state upkeep.
#[derive(Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
    rollup: RollupEngine,
    summary: SummaryEngine,
    cache: QueryCache,
    locks: RollupLocks,
}

impl TransactionRepository {
    /// Creates a new repository sharing the given cache and locks.
    #[must_use]
    pub fn new(db: DatabaseConnection, cache: QueryCache, locks: RollupLocks) -> Self {
        Self {
            rollup: RollupEngine::new(db.clone()),
            summary: SummaryEngine::new(db.clone()),
            db,
            cache,
            locks,
        }
    }

    /// Gets a transaction by ID.
    pub async fn find(&self, id: Uuid) -> Result<transactions::Model, TransactionError> {
        transactions::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::NotFound(id))
    }

    /// Lists transactions with their category, newest first.
    pub async fn list(
        &self,
        filter: TransactionFilter,
    ) -> Result<Vec<(transactions::Model, Option<categories::Model>)>, TransactionError> {
        let mut query = transactions::Entity::find().find_also_related(categories::Entity);
        if let Some(year_id) = filter.year_id {
            query = query.filter(transactions::Column::YearId.eq(year_id));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(transactions::Column::CategoryId.eq(category_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        if let Some(level) = filter.level {
            query = query.filter(categories::Column::Level.eq(level));
        }

        Ok(query
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    /// Creates a level-3 transaction and refreshes derived state.
    ///
    /// Validation order: amount, year exists, category exists, category
    /// is level 3. Uniqueness of the (year, category) pair is enforced
    /// by the unique index, not a read-then-insert check, so concurrent
    /// creates of the same pair still surface as [`TransactionError::Duplicate`].
    /// Nothing is written if any check fails. A rollup or summary failure
    /// after the insert does not fail the call.
    pub async fn create(
        &self,
        input: CreateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        if input.amount < Decimal::ZERO {
            return Err(TransactionError::InvalidAmount(input.amount));
        }
        self.ensure_year_exists(input.year_id).await?;
        let (_, kind) = self.resolve_manual_category(input.category_id).await?;

        let now = Utc::now().into();
        let model = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            year_id: Set(input.year_id),
            category_id: Set(input.category_id),
            amount: Set(input.amount),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let created = model.insert(&self.db).await.map_err(unique_conflict)?;

        self.refresh_best_effort(input.year_id, kind).await;
        self.cache.flush_all();

        Ok(created)
    }

    /// Updates a transaction's amount, year, or category.
    ///
    /// Moving the row onto an occupied (year, category) pair trips the
    /// unique index and maps to [`TransactionError::Duplicate`]. Derived
    /// state is refreshed for the old pair and, if different, the new
    /// pair.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateTransactionInput,
    ) -> Result<transactions::Model, TransactionError> {
        let existing = self.find(id).await?;
        let (_, old_kind) = self.resolve_manual_category(existing.category_id).await?;

        if let Some(amount) = input.amount {
            if amount < Decimal::ZERO {
                return Err(TransactionError::InvalidAmount(amount));
            }
        }

        let new_year_id = input.year_id.unwrap_or(existing.year_id);
        if new_year_id != existing.year_id {
            self.ensure_year_exists(new_year_id).await?;
        }

        let new_category_id = input.category_id.unwrap_or(existing.category_id);
        let new_kind = if new_category_id == existing.category_id {
            old_kind
        } else {
            self.resolve_manual_category(new_category_id).await?.1
        };

        let old_pair = (existing.year_id, old_kind);
        let mut active: transactions::ActiveModel = existing.into();
        active.year_id = Set(new_year_id);
        active.category_id = Set(new_category_id);
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await.map_err(unique_conflict)?;

        self.refresh_best_effort(old_pair.0, old_pair.1).await;
        if (new_year_id, new_kind) != old_pair {
            self.refresh_best_effort(new_year_id, new_kind).await;
        }
        self.cache.flush_all();

        Ok(updated)
    }

    /// Deletes a level-3 transaction and refreshes derived state.
    pub async fn delete(&self, id: Uuid) -> Result<(), TransactionError> {
        let existing = self.find(id).await?;
        let (_, kind) = self.resolve_manual_category(existing.category_id).await?;
        let year_id = existing.year_id;

        transactions::Entity::delete_by_id(existing.id)
            .exec(&self.db)
            .await?;

        self.refresh_best_effort(year_id, kind).await;
        self.cache.flush_all();

        Ok(())
    }

    /// Bulk-creates level-3 transactions.
    ///
    /// Every item is validated up front; an invalid item rejects the
    /// whole batch before anything is written. The insert itself runs in
    /// one database transaction, so a (year, category) collision fails
    /// the entire batch too (all-or-nothing). Rollup+summary runs once
    /// per distinct (year, kind) pair touched, not once per row.
    pub async fn bulk_create(
        &self,
        items: Vec<CreateTransactionInput>,
    ) -> Result<BulkCreateOutcome, TransactionError> {
        let mut pairs: BTreeSet<(Uuid, CategoryKind)> = BTreeSet::new();
        let mut models = Vec::with_capacity(items.len());
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        for item in &items {
            if item.amount < Decimal::ZERO {
                return Err(TransactionError::InvalidAmount(item.amount));
            }
            self.ensure_year_exists(item.year_id).await?;
            let (_, kind) = self.resolve_manual_category(item.category_id).await?;
            pairs.insert((item.year_id, kind));

            models.push(transactions::ActiveModel {
                id: Set(Uuid::new_v4()),
                year_id: Set(item.year_id),
                category_id: Set(item.category_id),
                amount: Set(item.amount),
                created_at: Set(now),
                updated_at: Set(now),
            });
        }

        let created = models.len();
        if created > 0 {
            let txn = self.db.begin().await?;
            let result = transactions::Entity::insert_many(models).exec(&txn).await;
            match result {
                Ok(_) => txn.commit().await?,
                Err(err) => {
                    txn.rollback().await?;
                    return Err(unique_conflict(err));
                }
            }
        }

        for (year_id, kind) in &pairs {
            self.refresh_best_effort(*year_id, *kind).await;
        }
        self.cache.flush_all();

        Ok(BulkCreateOutcome {
            created,
            rollup_cycles: pairs.len(),
        })
    }

    /// Recomputes rollups and summaries for every (year, kind) pair that
    /// has at least one level-3 transaction. Idempotent maintenance
    /// operation: repairs derived state left stale by swallowed rollup
    /// failures.
    ///
    /// # Errors
    ///
    /// Unlike the write paths, recomputation failures here propagate to
    /// the caller: this is the repair tool, a silent failure would leave
    /// nothing to fall back on.
    pub async fn ensure_all(&self) -> Result<EnsureOutcome, TransactionError> {
        let rows = transactions::Entity::find()
            .find_also_related(categories::Entity)
            .filter(categories::Column::Level.eq(MANUAL_LEVEL))
            .all(&self.db)
            .await?;

        let mut pairs: BTreeSet<(Uuid, CategoryKind)> = BTreeSet::new();
        for (tx, category) in rows {
            if let Some(category) = category {
                let kind = CategoryKind::parse(&category.kind)
                    .ok_or(TransactionError::InvalidKind(category.kind))?;
                pairs.insert((tx.year_id, kind));
            }
        }

        let years: BTreeSet<Uuid> = pairs.iter().map(|(year_id, _)| *year_id).collect();

        for (year_id, kind) in &pairs {
            let _guard = self.locks.acquire(*year_id, *kind).await;
            self.rollup
                .recompute(*year_id, *kind)
                .await
                .map_err(|e| match e {
                    crate::repositories::rollup::RollupError::Database(db) => {
                        TransactionError::Database(db)
                    }
                })?;
            self.summary.recompute(*year_id).await.map_err(|e| match e {
                crate::repositories::summary::SummaryError::Database(db) => {
                    TransactionError::Database(db)
                }
            })?;
        }

        self.cache.flush_all();

        Ok(EnsureOutcome {
            years: years.len(),
            cycles: pairs.len(),
        })
    }

    /// Runs rollup then summary for one (year, kind) pair under its
    /// lock, logging and swallowing failures. The primary write already
    /// succeeded; derived state left stale here is repaired by
    /// `ensure_all`.
    async fn refresh_best_effort(&self, year_id: Uuid, kind: CategoryKind) {
        let _guard = self.locks.acquire(year_id, kind).await;

        if let Err(error) = self.rollup.recompute(year_id, kind).await {
            tracing::warn!(
                %year_id,
                %kind,
                %error,
                "rollup failed after write, derived totals may be stale"
            );
            return;
        }
        if let Err(error) = self.summary.recompute(year_id).await {
            tracing::warn!(
                %year_id,
                %error,
                "summary recomputation failed after write, summary may be stale"
            );
        }
    }

    async fn ensure_year_exists(&self, year_id: Uuid) -> Result<(), TransactionError> {
        budget_years::Entity::find_by_id(year_id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::YearNotFound(year_id))?;
        Ok(())
    }

    /// Resolves a category and checks it accepts manual writes.
    async fn resolve_manual_category(
        &self,
        category_id: Uuid,
    ) -> Result<(categories::Model, CategoryKind), TransactionError> {
        let category = categories::Entity::find_by_id(category_id)
            .one(&self.db)
            .await?
            .ok_or(TransactionError::CategoryNotFound(category_id))?;

        if category.level != MANUAL_LEVEL {
            return Err(TransactionError::NotManualLevel(category.level));
        }

        let kind = CategoryKind::parse(&category.kind)
            .ok_or_else(|| TransactionError::InvalidKind(category.kind.clone()))?;

        Ok((category, kind))
    }
}

/// Maps a unique-index violation on (year, category) to `Duplicate`.
/// The index is the single authority on pair uniqueness; there is no
/// read-then-write check racing against concurrent inserts.
fn unique_conflict(err: DbErr) -> TransactionError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        TransactionError::Duplicate
    } else {
        TransactionError::Database(err)
    }
}

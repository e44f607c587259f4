//! Summary engine: maintains the per-year summary row.
//!
//! The summary is derived from level-1 Revenue/Expenditure rows and
//! level-2 Financing rows, and is always recomputed whole. A year with
//! no transactions gets no summary row; a stale row is removed.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use anggara_core::category::CategoryKind;
use anggara_core::summary::{self, FinancingRow, SummaryInputs};

use crate::entities::{categories, transactions, year_summaries};

/// Error types for summary operations.
#[derive(Debug, thiserror::Error)]
pub enum SummaryError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Engine recomputing year summary rows.
#[derive(Clone)]
pub struct SummaryEngine {
    db: DatabaseConnection,
}

impl SummaryEngine {
    /// Creates a new engine.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Recomputes and upserts the summary row for a year.
    ///
    /// Returns `None` when the year has no transactions; any existing
    /// summary row is deleted in that case.
    ///
    /// # Errors
    ///
    /// Returns [`SummaryError::Database`] if a read or write fails.
    pub async fn recompute(
        &self,
        year_id: Uuid,
    ) -> Result<Option<year_summaries::Model>, SummaryError> {
        let transaction_count = transactions::Entity::find()
            .filter(transactions::Column::YearId.eq(year_id))
            .count(&self.db)
            .await?;

        if transaction_count == 0 {
            year_summaries::Entity::delete_many()
                .filter(year_summaries::Column::YearId.eq(year_id))
                .exec(&self.db)
                .await?;
            return Ok(None);
        }

        let total_revenue = self.level_sum(year_id, CategoryKind::Revenue, 1).await?;
        let total_expenditure = self.level_sum(year_id, CategoryKind::Expenditure, 1).await?;

        let financing = self.financing_rows(year_id).await?;
        let totals = summary::classify_financing(&financing);
        if !totals.ambiguous.is_empty() {
            tracing::warn!(
                %year_id,
                categories = ?totals.ambiguous,
                "financing categories matched both receipt and disbursement; counted on both sides"
            );
        }

        let inputs = SummaryInputs {
            total_revenue,
            total_expenditure,
            financing_receipts: totals.receipts,
            financing_disbursements: totals.disbursements,
            transaction_count,
        };

        // transaction_count > 0 here, so compute always yields values.
        let Some(values) = summary::compute(&inputs) else {
            return Ok(None);
        };

        let now = Utc::now().into();
        let existing = year_summaries::Entity::find()
            .filter(year_summaries::Column::YearId.eq(year_id))
            .one(&self.db)
            .await?;

        let model = match existing {
            Some(row) => {
                let mut active: year_summaries::ActiveModel = row.into();
                active.total_revenue = Set(values.total_revenue);
                active.total_expenditure = Set(values.total_expenditure);
                active.surplus_deficit = Set(values.surplus_deficit);
                active.financing_receipts = Set(values.financing_receipts);
                active.financing_disbursements = Set(values.financing_disbursements);
                active.net_financing = Set(values.net_financing);
                active.ending_balance = Set(values.ending_balance);
                active.updated_at = Set(now);
                active.update(&self.db).await?
            }
            None => {
                let active = year_summaries::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    year_id: Set(year_id),
                    total_revenue: Set(values.total_revenue),
                    total_expenditure: Set(values.total_expenditure),
                    surplus_deficit: Set(values.surplus_deficit),
                    financing_receipts: Set(values.financing_receipts),
                    financing_disbursements: Set(values.financing_disbursements),
                    net_financing: Set(values.net_financing),
                    ending_balance: Set(values.ending_balance),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                active.insert(&self.db).await?
            }
        };

        Ok(Some(model))
    }

    /// Fetches the summary row for a year, if one exists.
    pub async fn find_by_year(
        &self,
        year_id: Uuid,
    ) -> Result<Option<year_summaries::Model>, SummaryError> {
        Ok(year_summaries::Entity::find()
            .filter(year_summaries::Column::YearId.eq(year_id))
            .one(&self.db)
            .await?)
    }

    /// Sums the year's transactions under categories of one kind and
    /// level. Summation happens in `Decimal`, never in floating point.
    async fn level_sum(
        &self,
        year_id: Uuid,
        kind: CategoryKind,
        level: i16,
    ) -> Result<Decimal, SummaryError> {
        let rows = transactions::Entity::find()
            .find_also_related(categories::Entity)
            .filter(transactions::Column::YearId.eq(year_id))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::Level.eq(level))
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(|(tx, _)| tx.amount).sum())
    }

    /// Fetches the year's level-2 Financing rows with their category's
    /// name and code for classification.
    async fn financing_rows(&self, year_id: Uuid) -> Result<Vec<FinancingRow>, SummaryError> {
        let rows = transactions::Entity::find()
            .find_also_related(categories::Entity)
            .filter(transactions::Column::YearId.eq(year_id))
            .filter(categories::Column::Kind.eq(CategoryKind::Financing.as_str()))
            .filter(categories::Column::Level.eq(2_i16))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(tx, category)| {
                category.map(|c| FinancingRow {
                    category_id: c.id,
                    name: c.name,
                    code: c.code,
                    amount: tx.amount,
                })
            })
            .collect())
    }
}

//! Dashboard repository for public analytics queries.
//!
//! Read-only views over the transaction table and the derived summary
//! rows: per-kind hierarchical breakdowns, a cross-year comparison, and
//! the composition of one kind at one level. Nothing here writes;
//! derived rows are maintained by the rollup and summary engines.

use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use uuid::Uuid;

use anggara_core::category::CategoryKind;

use crate::entities::{budget_years, categories, transactions, year_summaries};

/// Error types for dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Referenced budget year not found.
    #[error("budget year not found: {0}")]
    YearNotFound(Uuid),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// One category row in a breakdown, any level.
#[derive(Debug, Clone, Serialize)]
pub struct BreakdownRow {
    /// Category ID.
    pub category_id: Uuid,
    /// Hierarchical code, if assigned.
    pub code: Option<String>,
    /// Category name.
    pub name: String,
    /// Depth 1..=3.
    pub level: i16,
    /// Amount for this category in the requested year.
    pub amount: Decimal,
}

/// Hierarchical breakdown of one kind for one year.
#[derive(Debug, Clone, Serialize)]
pub struct Breakdown {
    /// Fiscal year number.
    pub year: i32,
    /// Non-zero category rows, level 1 first, then by code.
    pub rows: Vec<BreakdownRow>,
    /// Sum of the level-1 rows.
    pub total: Decimal,
}

/// One year's headline figures in the cross-year comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonRow {
    /// Fiscal year number.
    pub year: i32,
    /// Total revenue.
    pub total_revenue: Decimal,
    /// Total expenditure.
    pub total_expenditure: Decimal,
    /// Revenue minus expenditure.
    pub surplus_deficit: Decimal,
    /// Financing receipts minus disbursements.
    pub net_financing: Decimal,
}

/// One category's share in a composition.
#[derive(Debug, Clone, Serialize)]
pub struct CompositionRow {
    /// Category ID.
    pub category_id: Uuid,
    /// Category name.
    pub name: String,
    /// Hierarchical code, if assigned.
    pub code: Option<String>,
    /// Amount for this category.
    pub amount: Decimal,
    /// Share of the total, percent rounded to one decimal place.
    pub share_percent: Decimal,
}

/// Composition of one kind at one level for one year.
#[derive(Debug, Clone, Serialize)]
pub struct Composition {
    /// Fiscal year number.
    pub year: i32,
    /// Per-category shares, ordered by code.
    pub rows: Vec<CompositionRow>,
    /// Sum of all rows.
    pub total: Decimal,
}

/// Repository for dashboard analytics queries.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    db: DatabaseConnection,
}

impl DashboardRepository {
    /// Creates a new dashboard repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Queries the per-category breakdown of one kind for one year.
    ///
    /// Returns every category of the kind that carries a non-zero amount
    /// in the year, derived levels included, ordered level 1 first and
    /// then by code. The total is taken from the level-1 rows only; the
    /// deeper levels restate the same money.
    pub async fn breakdown(
        &self,
        year_id: Uuid,
        kind: CategoryKind,
    ) -> Result<Breakdown, DashboardError> {
        let year = self.find_year(year_id).await?;

        let category_list = categories::Entity::find()
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .order_by_asc(categories::Column::Level)
            .order_by_asc(categories::Column::Code)
            .order_by_asc(categories::Column::Name)
            .all(&self.db)
            .await?;

        // At most one transaction per (year, category), so a plain map.
        let amounts: HashMap<Uuid, Decimal> = transactions::Entity::find()
            .filter(transactions::Column::YearId.eq(year_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|tx| (tx.category_id, tx.amount))
            .collect();

        let mut rows = Vec::new();
        let mut total = Decimal::ZERO;
        for category in category_list {
            let Some(amount) = amounts.get(&category.id).copied() else {
                continue;
            };
            if amount.is_zero() {
                continue;
            }
            if category.level == 1 {
                total += amount;
            }
            rows.push(BreakdownRow {
                category_id: category.id,
                code: category.code,
                name: category.name,
                level: category.level,
                amount,
            });
        }

        Ok(Breakdown {
            year: year.year,
            rows,
            total,
        })
    }

    /// Queries headline figures for every year with a summary row,
    /// oldest first. Years without transactions have no summary row and
    /// are skipped.
    pub async fn comparison(&self) -> Result<Vec<ComparisonRow>, DashboardError> {
        let years = budget_years::Entity::find()
            .find_also_related(year_summaries::Entity)
            .order_by_asc(budget_years::Column::Year)
            .all(&self.db)
            .await?;

        Ok(years
            .into_iter()
            .filter_map(|(year, summary)| {
                summary.map(|s| ComparisonRow {
                    year: year.year,
                    total_revenue: s.total_revenue,
                    total_expenditure: s.total_expenditure,
                    surplus_deficit: s.surplus_deficit,
                    net_financing: s.net_financing,
                })
            })
            .collect())
    }

    /// Queries the composition of one kind at one level for one year:
    /// each category's amount and its percentage share of the level
    /// total, ordered by code.
    pub async fn composition(
        &self,
        year_id: Uuid,
        kind: CategoryKind,
        level: i16,
    ) -> Result<Composition, DashboardError> {
        let year = self.find_year(year_id).await?;

        let rows = transactions::Entity::find()
            .find_also_related(categories::Entity)
            .filter(transactions::Column::YearId.eq(year_id))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::Level.eq(level))
            .order_by_asc(categories::Column::Code)
            .all(&self.db)
            .await?;

        let total: Decimal = rows.iter().map(|(tx, _)| tx.amount).sum();

        let rows = rows
            .into_iter()
            .filter_map(|(tx, category)| {
                category.map(|c| {
                    let share_percent = if total.is_zero() {
                        Decimal::ZERO
                    } else {
                        (tx.amount / total * Decimal::ONE_HUNDRED).round_dp(1)
                    };
                    CompositionRow {
                        category_id: c.id,
                        name: c.name,
                        code: c.code,
                        amount: tx.amount,
                        share_percent,
                    }
                })
            })
            .collect();

        Ok(Composition {
            year: year.year,
            rows,
            total,
        })
    }

    async fn find_year(&self, year_id: Uuid) -> Result<budget_years::Model, DashboardError> {
        budget_years::Entity::find_by_id(year_id)
            .one(&self.db)
            .await?
            .ok_or(DashboardError::YearNotFound(year_id))
    }
}

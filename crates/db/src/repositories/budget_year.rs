//! Budget year repository.
//!
//! Budget years are master data, mutated only through explicit admin
//! operations and never deleted while transactions reference them.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::{budget_years, transactions, year_summaries};

/// Error types for budget year operations.
#[derive(Debug, thiserror::Error)]
pub enum BudgetYearError {
    /// Budget year not found.
    #[error("budget year not found: {0}")]
    NotFound(Uuid),

    /// A budget year with this fiscal year already exists.
    #[error("budget year {0} already exists")]
    DuplicateYear(i32),

    /// Year still referenced by transactions.
    #[error("budget year has transactions and cannot be deleted")]
    HasTransactions,

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a budget year.
#[derive(Debug, Clone)]
pub struct CreateBudgetYearInput {
    /// Fiscal year, e.g. 2026.
    pub year: i32,
    /// Regional regulation number, if already enacted.
    pub regulation_number: Option<String>,
    /// Enactment date.
    pub enactment_date: Option<chrono::NaiveDate>,
}

/// Input for updating a budget year.
#[derive(Debug, Clone, Default)]
pub struct UpdateBudgetYearInput {
    /// New fiscal year.
    pub year: Option<i32>,
    /// New regulation number (`Some(None)` clears it).
    pub regulation_number: Option<Option<String>>,
    /// New enactment date (`Some(None)` clears it).
    pub enactment_date: Option<Option<chrono::NaiveDate>>,
}

/// Repository for budget year operations.
#[derive(Clone)]
pub struct BudgetYearRepository {
    db: DatabaseConnection,
}

impl BudgetYearRepository {
    /// Creates a new repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a budget year.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetYearError::DuplicateYear`] if the fiscal year is
    /// already registered.
    pub async fn create(
        &self,
        input: CreateBudgetYearInput,
    ) -> Result<budget_years::Model, BudgetYearError> {
        let existing = budget_years::Entity::find()
            .filter(budget_years::Column::Year.eq(input.year))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(BudgetYearError::DuplicateYear(input.year));
        }

        let now = Utc::now().into();
        let model = budget_years::ActiveModel {
            id: Set(Uuid::new_v4()),
            year: Set(input.year),
            regulation_number: Set(input.regulation_number),
            enactment_date: Set(input.enactment_date),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&self.db).await?)
    }

    /// Gets a budget year by ID.
    pub async fn get(&self, id: Uuid) -> Result<budget_years::Model, BudgetYearError> {
        budget_years::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(BudgetYearError::NotFound(id))
    }

    /// Lists all budget years, newest fiscal year first.
    pub async fn list(&self) -> Result<Vec<budget_years::Model>, BudgetYearError> {
        Ok(budget_years::Entity::find()
            .order_by_desc(budget_years::Column::Year)
            .all(&self.db)
            .await?)
    }

    /// Updates a budget year.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetYearError::DuplicateYear`] if the new fiscal year
    /// collides with another row.
    pub async fn update(
        &self,
        id: Uuid,
        input: UpdateBudgetYearInput,
    ) -> Result<budget_years::Model, BudgetYearError> {
        let year = self.get(id).await?;

        if let Some(new_year) = input.year {
            let collision = budget_years::Entity::find()
                .filter(budget_years::Column::Year.eq(new_year))
                .filter(budget_years::Column::Id.ne(id))
                .one(&self.db)
                .await?;
            if collision.is_some() {
                return Err(BudgetYearError::DuplicateYear(new_year));
            }
        }

        let mut active: budget_years::ActiveModel = year.into();
        if let Some(new_year) = input.year {
            active.year = Set(new_year);
        }
        if let Some(regulation_number) = input.regulation_number {
            active.regulation_number = Set(regulation_number);
        }
        if let Some(enactment_date) = input.enactment_date {
            active.enactment_date = Set(enactment_date);
        }
        active.updated_at = Set(Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a budget year.
    ///
    /// # Errors
    ///
    /// Returns [`BudgetYearError::HasTransactions`] if any transaction
    /// still references the year. The year's summary row, if present, is
    /// removed with it.
    pub async fn delete(&self, id: Uuid) -> Result<(), BudgetYearError> {
        let year = self.get(id).await?;

        let referenced = transactions::Entity::find()
            .filter(transactions::Column::YearId.eq(id))
            .count(&self.db)
            .await?;
        if referenced > 0 {
            return Err(BudgetYearError::HasTransactions);
        }

        year_summaries::Entity::delete_many()
            .filter(year_summaries::Column::YearId.eq(id))
            .exec(&self.db)
            .await?;

        budget_years::Entity::delete_by_id(year.id)
            .exec(&self.db)
            .await?;
        Ok(())
    }
}

//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - The rollup and summary engines that maintain derived state
//! - Database migrations
//! - The query cache and the keyed rollup locks

pub mod cache;
pub mod entities;
pub mod lock;
pub mod migration;
pub mod repositories;

pub use cache::QueryCache;
pub use lock::RollupLocks;
pub use repositories::{
    AdminRepository, BudgetYearRepository, CategoryRepository, DashboardRepository, RollupEngine,
    SummaryEngine, TransactionRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. The rollup and summary engines live here too: they are
//! the only writers of derived transaction rows and summary rows.

pub mod admin;
pub mod budget_year;
pub mod category;
pub mod dashboard;
pub mod rollup;
pub mod summary;
pub mod transaction;

pub use admin::{AdminError, AdminRepository};
pub use budget_year::{
    BudgetYearError, BudgetYearRepository, CreateBudgetYearInput, UpdateBudgetYearInput,
};
pub use category::{
    CategoryError, CategoryNode, CategoryRepository, CreateCategoryInput, UpdateCategoryInput,
};
pub use dashboard::{
    Breakdown, BreakdownRow, ComparisonRow, Composition, CompositionRow, DashboardError,
    DashboardRepository,
};
pub use rollup::{RollupEngine, RollupError, RollupOutcome};
pub use summary::{SummaryEngine, SummaryError};
pub use transaction::{
    BulkCreateOutcome, CreateTransactionInput, EnsureOutcome, TransactionError, TransactionFilter,
    TransactionRepository, UpdateTransactionInput,
};

//! `SeaORM` entity definitions.

pub mod admins;
pub mod budget_years;
pub mod categories;
pub mod transactions;
pub mod year_summaries;

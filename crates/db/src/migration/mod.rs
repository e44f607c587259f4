//! Database migrations.
//!
//! Migrations are managed using sea-orm-migration and written with the
//! schema DSL so they run on both Postgres and SQLite (tests use an
//! in-memory SQLite database).

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_initial;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_000001_initial::Migration)]
    }
}

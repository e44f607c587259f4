//! Shared helpers for integration tests.
//!
//! Tests run against an in-memory SQLite database with the migrations
//! applied. The pool is capped at one connection: each SQLite `:memory:`
//! connection is its own database.

use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

use anggara_core::category::CategoryKind;
use anggara_db::migration::{Migrator, MigratorTrait};
use anggara_db::repositories::{
    BudgetYearRepository, CategoryRepository, CreateBudgetYearInput, CreateCategoryInput,
    CreateTransactionInput, TransactionRepository,
};
use anggara_db::{QueryCache, RollupLocks};

/// Connects to a fresh in-memory database with the schema applied.
pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1);

    let db = Database::connect(opts)
        .await
        .expect("failed to open in-memory database");
    Migrator::up(&db, None).await.expect("migrations failed");
    db
}

/// Builds a transaction repository with a fresh cache and lock registry.
pub fn transaction_repo(db: &DatabaseConnection) -> TransactionRepository {
    TransactionRepository::new(db.clone(), QueryCache::new(), RollupLocks::new())
}

/// Creates a budget year and returns its ID.
pub async fn seed_year(db: &DatabaseConnection, year: i32) -> Uuid {
    BudgetYearRepository::new(db.clone())
        .create(CreateBudgetYearInput {
            year,
            regulation_number: None,
            enactment_date: None,
        })
        .await
        .expect("failed to seed budget year")
        .id
}

/// IDs of one seeded 3-level branch.
pub struct Branch {
    pub root: Uuid,
    pub group: Uuid,
    pub leaf_a: Uuid,
    pub leaf_b: Uuid,
}

/// Seeds a level-1 root, one level-2 group, and two level-3 leaves of
/// the given kind. `prefix` keeps names and codes unique across calls.
pub async fn seed_branch(db: &DatabaseConnection, kind: CategoryKind, prefix: &str) -> Branch {
    let repo = CategoryRepository::new(db.clone());

    let root = repo
        .create(CreateCategoryInput {
            parent_id: None,
            kind,
            name: format!("{prefix} Root"),
            code: Some(format!("{prefix}.r")),
            level: 1,
        })
        .await
        .expect("failed to seed root category");

    let group = repo
        .create(CreateCategoryInput {
            parent_id: Some(root.id),
            kind,
            name: format!("{prefix} Group"),
            code: Some(format!("{prefix}.g")),
            level: 2,
        })
        .await
        .expect("failed to seed group category");

    let leaf_a = repo
        .create(CreateCategoryInput {
            parent_id: Some(group.id),
            kind,
            name: format!("{prefix} Leaf A"),
            code: Some(format!("{prefix}.a")),
            level: 3,
        })
        .await
        .expect("failed to seed leaf category");

    let leaf_b = repo
        .create(CreateCategoryInput {
            parent_id: Some(group.id),
            kind,
            name: format!("{prefix} Leaf B"),
            code: Some(format!("{prefix}.b")),
            level: 3,
        })
        .await
        .expect("failed to seed leaf category");

    Branch {
        root: root.id,
        group: group.id,
        leaf_a: leaf_a.id,
        leaf_b: leaf_b.id,
    }
}

/// Creates a level-3 transaction through the service.
pub async fn create_tx(
    repo: &TransactionRepository,
    year_id: Uuid,
    category_id: Uuid,
    amount: Decimal,
) -> Uuid {
    repo.create(CreateTransactionInput {
        year_id,
        category_id,
        amount,
    })
    .await
    .expect("failed to create transaction")
    .id
}

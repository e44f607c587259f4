//! Integration tests for the transaction service.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;

use anggara_core::category::CategoryKind;
use anggara_db::entities::transactions;
use anggara_db::repositories::{
    CategoryRepository, CreateCategoryInput, CreateTransactionInput, TransactionError,
    TransactionRepository, UpdateTransactionInput,
};
use anggara_db::{QueryCache, RollupLocks};

use common::{create_tx, seed_branch, seed_year, setup_db, transaction_repo};

async fn amount_of(db: &DatabaseConnection, year_id: Uuid, category_id: Uuid) -> Option<Decimal> {
    transactions::Entity::find()
        .filter(transactions::Column::YearId.eq(year_id))
        .filter(transactions::Column::CategoryId.eq(category_id))
        .one(db)
        .await
        .unwrap()
        .map(|tx| tx.amount)
}

async fn row_count(db: &DatabaseConnection) -> u64 {
    transactions::Entity::find().count(db).await.unwrap()
}

#[tokio::test]
async fn test_create_rejects_negative_amount_before_anything_else() {
    let db = setup_db().await;
    let repo = transaction_repo(&db);

    // Year and category do not even exist: the amount check comes first.
    let result = repo
        .create(CreateTransactionInput {
            year_id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            amount: dec!(-1),
        })
        .await;

    assert!(matches!(result, Err(TransactionError::InvalidAmount(_))));
    assert_eq!(row_count(&db).await, 0);
}

#[tokio::test]
async fn test_create_resolves_year_then_category() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    let missing_year = repo
        .create(CreateTransactionInput {
            year_id: Uuid::new_v4(),
            category_id: branch.leaf_a,
            amount: dec!(10),
        })
        .await;
    assert!(matches!(missing_year, Err(TransactionError::YearNotFound(_))));

    let missing_category = repo
        .create(CreateTransactionInput {
            year_id: year,
            category_id: Uuid::new_v4(),
            amount: dec!(10),
        })
        .await;
    assert!(matches!(
        missing_category,
        Err(TransactionError::CategoryNotFound(_))
    ));
    assert_eq!(row_count(&db).await, 0);
}

#[tokio::test]
async fn test_manual_writes_rejected_below_level_three() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    for category_id in [branch.root, branch.group] {
        let result = repo
            .create(CreateTransactionInput {
                year_id: year,
                category_id,
                amount: dec!(10),
            })
            .await;
        assert!(matches!(result, Err(TransactionError::NotManualLevel(_))));
    }

    // The table is unchanged.
    assert_eq!(row_count(&db).await, 0);
}

#[tokio::test]
async fn test_duplicate_pair_conflicts_and_leaves_one_row() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    create_tx(&repo, year, branch.leaf_a, dec!(100)).await;

    let second = repo
        .create(CreateTransactionInput {
            year_id: year,
            category_id: branch.leaf_a,
            amount: dec!(999),
        })
        .await;
    assert!(matches!(second, Err(TransactionError::Duplicate)));

    let rows = transactions::Entity::find()
        .filter(transactions::Column::CategoryId.eq(branch.leaf_a))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(amount_of(&db, year, branch.leaf_a).await, Some(dec!(100)));
}

#[tokio::test]
async fn test_racing_creates_of_same_pair_leave_one_row_and_a_conflict() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    let repo_a = repo.clone();
    let repo_b = repo.clone();
    let leaf = branch.leaf_a;

    let task_a = tokio::spawn(async move {
        repo_a
            .create(CreateTransactionInput {
                year_id: year,
                category_id: leaf,
                amount: dec!(100),
            })
            .await
    });
    let task_b = tokio::spawn(async move {
        repo_b
            .create(CreateTransactionInput {
                year_id: year,
                category_id: leaf,
                amount: dec!(200),
            })
            .await
    });

    let results = [task_a.await.unwrap(), task_b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    // The loser hits the unique index and gets Duplicate, not a raw
    // database error.
    for result in &results {
        if let Err(err) = result {
            assert!(matches!(err, TransactionError::Duplicate));
        }
    }

    let rows = transactions::Entity::find()
        .filter(transactions::Column::CategoryId.eq(branch.leaf_a))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(rows, 1);

    // Derived rows carry the winner's amount, whichever it was.
    let winner_amount = amount_of(&db, year, branch.leaf_a).await.unwrap();
    assert!(winner_amount == dec!(100) || winner_amount == dec!(200));
    assert_eq!(
        amount_of(&db, year, branch.group).await,
        Some(winner_amount)
    );
}

#[tokio::test]
async fn test_concurrent_creates_under_same_pair_lose_no_update() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    let repo_a = repo.clone();
    let repo_b = repo.clone();
    let (leaf_a, leaf_b) = (branch.leaf_a, branch.leaf_b);

    let task_a = tokio::spawn(async move {
        repo_a
            .create(CreateTransactionInput {
                year_id: year,
                category_id: leaf_a,
                amount: dec!(100),
            })
            .await
    });
    let task_b = tokio::spawn(async move {
        repo_b
            .create(CreateTransactionInput {
                year_id: year,
                category_id: leaf_b,
                amount: dec!(200),
            })
            .await
    });

    task_a.await.unwrap().unwrap();
    task_b.await.unwrap().unwrap();

    // Whatever the interleaving, the derived total reflects both rows.
    assert_eq!(amount_of(&db, year, branch.group).await, Some(dec!(300)));
    assert_eq!(amount_of(&db, year, branch.root).await, Some(dec!(300)));
}

#[tokio::test]
async fn test_bulk_create_runs_one_cycle_per_pair() {
    let db = setup_db().await;
    let year_a = seed_year(&db, 2026).await;
    let year_b = seed_year(&db, 2027).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    // Three extra leaves so each year gets five transactions.
    let categories = CategoryRepository::new(db.clone());
    let mut leaves = vec![branch.leaf_a, branch.leaf_b];
    for i in 0..3 {
        let leaf = categories
            .create(CreateCategoryInput {
                parent_id: Some(branch.group),
                kind: CategoryKind::Revenue,
                name: format!("rev Extra {i}"),
                code: Some(format!("rev.x{i}")),
                level: 3,
            })
            .await
            .unwrap();
        leaves.push(leaf.id);
    }

    let mut items = Vec::new();
    for year in [year_a, year_b] {
        for &leaf in &leaves {
            items.push(CreateTransactionInput {
                year_id: year,
                category_id: leaf,
                amount: dec!(10),
            });
        }
    }
    assert_eq!(items.len(), 10);

    let outcome = repo.bulk_create(items).await.unwrap();
    assert_eq!(outcome.created, 10);
    // Ten rows, two distinct (year, kind) pairs: exactly two cycles.
    assert_eq!(outcome.rollup_cycles, 2);

    assert_eq!(amount_of(&db, year_a, branch.group).await, Some(dec!(50)));
    assert_eq!(amount_of(&db, year_b, branch.group).await, Some(dec!(50)));
}

#[tokio::test]
async fn test_bulk_create_is_all_or_nothing_on_duplicates() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    create_tx(&repo, year, branch.leaf_a, dec!(100)).await;
    let before = row_count(&db).await;

    // leaf_a collides with the existing row; leaf_b alone would be fine.
    let result = repo
        .bulk_create(vec![
            CreateTransactionInput {
                year_id: year,
                category_id: branch.leaf_b,
                amount: dec!(50),
            },
            CreateTransactionInput {
                year_id: year,
                category_id: branch.leaf_a,
                amount: dec!(75),
            },
        ])
        .await;

    assert!(matches!(result, Err(TransactionError::Duplicate)));
    assert_eq!(row_count(&db).await, before);
    assert_eq!(amount_of(&db, year, branch.leaf_b).await, None);
}

#[tokio::test]
async fn test_update_amount_recomputes_derived_rows() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    let tx = create_tx(&repo, year, branch.leaf_a, dec!(100)).await;
    repo.update(
        tx,
        UpdateTransactionInput {
            amount: Some(dec!(250)),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(amount_of(&db, year, branch.leaf_a).await, Some(dec!(250)));
    assert_eq!(amount_of(&db, year, branch.group).await, Some(dec!(250)));
}

#[tokio::test]
async fn test_update_moving_years_refreshes_both_years() {
    let db = setup_db().await;
    let year_a = seed_year(&db, 2026).await;
    let year_b = seed_year(&db, 2027).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    let tx = create_tx(&repo, year_a, branch.leaf_a, dec!(100)).await;
    assert_eq!(amount_of(&db, year_a, branch.group).await, Some(dec!(100)));

    repo.update(
        tx,
        UpdateTransactionInput {
            year_id: Some(year_b),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    // The old year's derived rows are gone, the new year's exist.
    assert_eq!(amount_of(&db, year_a, branch.group).await, None);
    assert_eq!(amount_of(&db, year_b, branch.group).await, Some(dec!(100)));
}

#[tokio::test]
async fn test_update_to_occupied_pair_conflicts() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    create_tx(&repo, year, branch.leaf_a, dec!(100)).await;
    let tx_b = create_tx(&repo, year, branch.leaf_b, dec!(200)).await;

    let result = repo
        .update(
            tx_b,
            UpdateTransactionInput {
                category_id: Some(branch.leaf_a),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(TransactionError::Duplicate)));
    assert_eq!(amount_of(&db, year, branch.leaf_b).await, Some(dec!(200)));
}

#[tokio::test]
async fn test_writes_flush_the_query_cache() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;

    let cache = QueryCache::new();
    let repo = TransactionRepository::new(db.clone(), cache.clone(), RollupLocks::new());

    cache.insert("transactions:list:all", json!([]));
    assert!(cache.get("transactions:list:all").is_some());

    create_tx(&repo, year, branch.leaf_a, dec!(100)).await;

    cache.run_pending_tasks();
    assert!(cache.get("transactions:list:all").is_none());
}

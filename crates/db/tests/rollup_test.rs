//! Integration tests for the rollup and summary engines.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use anggara_core::category::CategoryKind;
use anggara_db::entities::transactions;
use anggara_db::repositories::{
    CategoryRepository, CreateCategoryInput, RollupEngine, SummaryEngine,
};

use common::{create_tx, seed_branch, seed_year, setup_db, transaction_repo};

/// Amount of the (year, category) transaction, if one exists.
async fn amount_of(db: &DatabaseConnection, year_id: Uuid, category_id: Uuid) -> Option<Decimal> {
    transactions::Entity::find()
        .filter(transactions::Column::YearId.eq(year_id))
        .filter(transactions::Column::CategoryId.eq(category_id))
        .one(db)
        .await
        .unwrap()
        .map(|tx| tx.amount)
}

/// All derived rows for a year as (category, amount) pairs, sorted.
async fn derived_state(db: &DatabaseConnection, year_id: Uuid) -> Vec<(Uuid, Uuid, Decimal)> {
    let mut rows: Vec<(Uuid, Uuid, Decimal)> = transactions::Entity::find()
        .filter(transactions::Column::YearId.eq(year_id))
        .all(db)
        .await
        .unwrap()
        .into_iter()
        .map(|tx| (tx.id, tx.category_id, tx.amount))
        .collect();
    rows.sort();
    rows
}

#[tokio::test]
async fn test_rollup_propagates_through_both_levels() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    create_tx(&repo, year, branch.leaf_a, dec!(100)).await;
    create_tx(&repo, year, branch.leaf_b, dec!(200)).await;

    assert_eq!(amount_of(&db, year, branch.group).await, Some(dec!(300)));
    assert_eq!(amount_of(&db, year, branch.root).await, Some(dec!(300)));
}

#[tokio::test]
async fn test_rollup_is_idempotent() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Expenditure, "exp").await;
    let repo = transaction_repo(&db);

    create_tx(&repo, year, branch.leaf_a, dec!(150)).await;
    create_tx(&repo, year, branch.leaf_b, dec!(50)).await;

    let engine = RollupEngine::new(db.clone());
    engine
        .recompute(year, CategoryKind::Expenditure)
        .await
        .unwrap();
    let first = derived_state(&db, year).await;

    engine
        .recompute(year, CategoryKind::Expenditure)
        .await
        .unwrap();
    let second = derived_state(&db, year).await;

    // Identical row IDs and amounts: no duplicates, no drift.
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_removing_transactions_shrinks_then_deletes_derived_rows() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    let tx_a = create_tx(&repo, year, branch.leaf_a, dec!(100)).await;
    let tx_b = create_tx(&repo, year, branch.leaf_b, dec!(200)).await;
    assert_eq!(amount_of(&db, year, branch.group).await, Some(dec!(300)));

    repo.delete(tx_a).await.unwrap();
    assert_eq!(amount_of(&db, year, branch.group).await, Some(dec!(200)));

    repo.delete(tx_b).await.unwrap();
    // The derived rows are gone entirely, not stored with amount 0.
    assert_eq!(amount_of(&db, year, branch.group).await, None);
    assert_eq!(amount_of(&db, year, branch.root).await, None);
}

#[tokio::test]
async fn test_summary_from_one_sided_revenue() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    create_tx(&repo, year, branch.leaf_a, dec!(500)).await;

    let summary = SummaryEngine::new(db.clone())
        .find_by_year(year)
        .await
        .unwrap()
        .expect("summary row should exist");

    assert_eq!(summary.total_revenue, dec!(500));
    assert_eq!(summary.total_expenditure, dec!(0));
    assert_eq!(summary.surplus_deficit, dec!(500));
    assert_eq!(summary.ending_balance, dec!(500));
}

#[tokio::test]
async fn test_summary_row_absent_for_empty_year_and_removed_when_drained() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);
    let engine = SummaryEngine::new(db.clone());

    // No transactions: recompute yields no row.
    assert!(engine.recompute(year).await.unwrap().is_none());
    assert!(engine.find_by_year(year).await.unwrap().is_none());

    // A write materializes the summary; draining the year removes it.
    let tx = create_tx(&repo, year, branch.leaf_a, dec!(100)).await;
    assert!(engine.find_by_year(year).await.unwrap().is_some());

    repo.delete(tx).await.unwrap();
    assert!(engine.find_by_year(year).await.unwrap().is_none());
}

#[tokio::test]
async fn test_summary_classifies_financing_sides() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let categories = CategoryRepository::new(db.clone());

    let root = categories
        .create(CreateCategoryInput {
            parent_id: None,
            kind: CategoryKind::Financing,
            name: "Financing".into(),
            code: Some("6".into()),
            level: 1,
        })
        .await
        .unwrap();
    let receipts = categories
        .create(CreateCategoryInput {
            parent_id: Some(root.id),
            kind: CategoryKind::Financing,
            name: "Financing Receipts".into(),
            code: Some("6.1".into()),
            level: 2,
        })
        .await
        .unwrap();
    let disbursements = categories
        .create(CreateCategoryInput {
            parent_id: Some(root.id),
            kind: CategoryKind::Financing,
            name: "Financing Disbursements".into(),
            code: Some("6.2".into()),
            level: 2,
        })
        .await
        .unwrap();
    let receipt_leaf = categories
        .create(CreateCategoryInput {
            parent_id: Some(receipts.id),
            kind: CategoryKind::Financing,
            name: "Prior-Year Budget Surplus".into(),
            code: Some("6.1.1".into()),
            level: 3,
        })
        .await
        .unwrap();
    let disbursement_leaf = categories
        .create(CreateCategoryInput {
            parent_id: Some(disbursements.id),
            kind: CategoryKind::Financing,
            name: "Capital Participation".into(),
            code: Some("6.2.1".into()),
            level: 3,
        })
        .await
        .unwrap();

    let repo = transaction_repo(&db);
    create_tx(&repo, year, receipt_leaf.id, dec!(100)).await;
    create_tx(&repo, year, disbursement_leaf.id, dec!(40)).await;

    let summary = SummaryEngine::new(db.clone())
        .find_by_year(year)
        .await
        .unwrap()
        .expect("summary row should exist");

    assert_eq!(summary.financing_receipts, dec!(100));
    assert_eq!(summary.financing_disbursements, dec!(40));
    assert_eq!(summary.net_financing, dec!(60));
    assert_eq!(summary.ending_balance, dec!(60));
}

#[tokio::test]
async fn test_ensure_all_repairs_stale_derived_state() {
    let db = setup_db().await;
    let year = seed_year(&db, 2026).await;
    let branch = seed_branch(&db, CategoryKind::Revenue, "rev").await;
    let repo = transaction_repo(&db);

    create_tx(&repo, year, branch.leaf_a, dec!(100)).await;
    create_tx(&repo, year, branch.leaf_b, dec!(200)).await;

    // Simulate staleness left by a swallowed rollup failure.
    let group_row = transactions::Entity::find()
        .filter(transactions::Column::YearId.eq(year))
        .filter(transactions::Column::CategoryId.eq(branch.group))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    transactions::Entity::delete_by_id(group_row.id)
        .exec(&db)
        .await
        .unwrap();
    assert_eq!(amount_of(&db, year, branch.group).await, None);

    let outcome = repo.ensure_all().await.unwrap();
    assert_eq!(outcome.years, 1);
    assert_eq!(outcome.cycles, 1);
    assert_eq!(amount_of(&db, year, branch.group).await, Some(dec!(300)));
    assert_eq!(amount_of(&db, year, branch.root).await, Some(dec!(300)));
}

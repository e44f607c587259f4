//! Transaction routes.
//!
//! Mutations go through the transaction service, which validates, writes
//! the level-3 row, rebuilds derived state under the per-(year, kind)
//! lock, and flushes the cache.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::routes::{cache_key, parse_kind};
use crate::{AppState, error::ApiError, middleware::AuthUser};
use anggara_db::repositories::{
    CreateTransactionInput, TransactionFilter, UpdateTransactionInput,
};
use anggara_shared::AppError;

/// Creates the public transaction routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions))
        .route("/transactions/{id}", get(get_transaction))
}

/// Creates the admin transaction routes.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(create_transaction))
        .route("/transactions/bulk", post(bulk_create_transactions))
        .route("/transactions/{id}", put(update_transaction))
        .route("/transactions/{id}", delete(delete_transaction))
}

/// Query parameters for listing transactions.
#[derive(Debug, Deserialize, Default)]
pub struct ListTransactionsQuery {
    /// Filter by budget year.
    pub year_id: Option<Uuid>,
    /// Filter by category.
    pub category_id: Option<Uuid>,
    /// Filter by category kind.
    pub kind: Option<String>,
    /// Filter by category level.
    pub level: Option<i16>,
}

/// Request body for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Budget year ID.
    pub year_id: Uuid,
    /// Level-3 category ID.
    pub category_id: Uuid,
    /// Non-negative amount.
    pub amount: Decimal,
}

/// Request body for updating a transaction.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateTransactionRequest {
    /// New budget year ID.
    pub year_id: Option<Uuid>,
    /// New level-3 category ID.
    pub category_id: Option<Uuid>,
    /// New amount.
    pub amount: Option<Decimal>,
}

/// Request body for bulk creation.
#[derive(Debug, Deserialize)]
pub struct BulkCreateRequest {
    /// Transactions to create.
    pub transactions: Vec<CreateTransactionRequest>,
}

/// GET `/transactions` - Lists transactions with categories, cached.
async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;

    let cache_key = cache_key(
        "transactions:list",
        [
            query.year_id.map(|id| id.to_string()),
            query.category_id.map(|id| id.to_string()),
            kind.map(|k| k.as_str().to_owned()),
            query.level.map(|l| l.to_string()),
        ],
    );
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json((*cached).clone()));
    }

    let repo = state.transaction_repo();
    let rows = repo
        .list(TransactionFilter {
            year_id: query.year_id,
            category_id: query.category_id,
            kind,
            level: query.level,
        })
        .await?;

    let items: Vec<serde_json::Value> = rows
        .into_iter()
        .map(|(tx, category)| json!({ "transaction": tx, "category": category }))
        .collect();
    let body = json!({ "transactions": items });

    state.cache.insert(cache_key, body.clone());
    Ok(Json(body))
}

/// GET `/transactions/{id}` - Gets one transaction.
async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.transaction_repo();
    let tx = repo.find(id).await?;
    Ok(Json(json!({ "transaction": tx })))
}

/// POST `/transactions` - Creates a level-3 transaction.
async fn create_transaction(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.transaction_repo();
    let tx = repo
        .create(CreateTransactionInput {
            year_id: payload.year_id,
            category_id: payload.category_id,
            amount: payload.amount,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "transaction": tx }))))
}

/// PUT `/transactions/{id}` - Updates a transaction.
async fn update_transaction(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.transaction_repo();
    let tx = repo
        .update(
            id,
            UpdateTransactionInput {
                year_id: payload.year_id,
                category_id: payload.category_id,
                amount: payload.amount,
            },
        )
        .await?;

    Ok(Json(json!({ "transaction": tx })))
}

/// DELETE `/transactions/{id}` - Deletes a transaction.
async fn delete_transaction(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.transaction_repo();
    repo.delete(id).await?;
    Ok(Json(json!({ "message": "transaction deleted" })))
}

/// POST `/transactions/bulk` - Creates many level-3 transactions.
///
/// All-or-nothing: any invalid item rejects the batch before anything is
/// written. Rollup+summary runs once per distinct (year, kind) pair.
async fn bulk_create_transactions(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<BulkCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.transactions.is_empty() {
        return Err(AppError::Validation("transactions array cannot be empty".into()).into());
    }

    let items: Vec<CreateTransactionInput> = payload
        .transactions
        .into_iter()
        .map(|t| CreateTransactionInput {
            year_id: t.year_id,
            category_id: t.category_id,
            amount: t.amount,
        })
        .collect();

    let repo = state.transaction_repo();
    let outcome = repo.bulk_create(items).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "created": outcome.created,
            "rollup_cycles": outcome.rollup_cycles,
        })),
    ))
}

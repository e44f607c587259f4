//! Category routes: flat list, tree view, and admin CRUD.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::routes::{cache_key, parse_kind};
use crate::{AppState, error::ApiError, middleware::AuthUser};
use anggara_db::{
    CategoryRepository,
    repositories::{CreateCategoryInput, UpdateCategoryInput},
};
use anggara_shared::AppError;

/// Creates the public category routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/tree", get(category_tree))
        .route("/categories/{id}", get(get_category))
}

/// Creates the admin category routes.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", post(create_category))
        .route("/categories/{id}", put(update_category))
        .route("/categories/{id}", delete(delete_category))
}

/// Query parameters for listing categories.
#[derive(Debug, Deserialize, Default)]
pub struct ListCategoriesQuery {
    /// Filter by kind: revenue, expenditure, or financing.
    pub kind: Option<String>,
    /// Filter by level (1..=3).
    pub level: Option<i16>,
}

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Parent category ID, required for levels 2 and 3.
    pub parent_id: Option<Uuid>,
    /// Kind: revenue, expenditure, or financing.
    pub kind: String,
    /// Display name.
    pub name: String,
    /// Hierarchical code such as "4.1.2".
    pub code: Option<String>,
    /// Depth, 1..=3.
    pub level: i16,
}

/// Request body for updating a category.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateCategoryRequest {
    /// New name.
    pub name: Option<String>,
    /// New code.
    pub code: Option<String>,
}

/// GET `/categories` - Lists categories, optionally filtered, cached.
async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;

    let cache_key = cache_key(
        "categories:list",
        [
            kind.map(|k| k.as_str().to_owned()),
            query.level.map(|l| l.to_string()),
        ],
    );
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json((*cached).clone()));
    }

    let repo = CategoryRepository::new((*state.db).clone());
    let categories = repo.list(kind, query.level).await?;
    let body = json!({ "categories": categories });

    state.cache.insert(cache_key, body.clone());
    Ok(Json(body))
}

/// GET `/categories/tree` - The nested category tree, cached.
async fn category_tree(
    State(state): State<AppState>,
    Query(query): Query<ListCategoriesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = query.kind.as_deref().map(parse_kind).transpose()?;

    let cache_key = cache_key("categories:tree", [kind.map(|k| k.as_str().to_owned())]);
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json((*cached).clone()));
    }

    let repo = CategoryRepository::new((*state.db).clone());
    let tree = repo.tree(kind).await?;
    let body = json!({ "categories": tree });

    state.cache.insert(cache_key, body.clone());
    Ok(Json(body))
}

/// GET `/categories/{id}` - Gets one category.
async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());
    let category = repo.get(id).await?;
    Ok(Json(json!({ "category": category })))
}

/// POST `/categories` - Creates a category.
async fn create_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&payload.kind)?;
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("category name is required".into()).into());
    }

    let repo = CategoryRepository::new((*state.db).clone());
    let category = repo
        .create(CreateCategoryInput {
            parent_id: payload.parent_id,
            kind,
            name: payload.name,
            code: payload.code,
            level: payload.level,
        })
        .await?;

    state.cache.flush_all();
    Ok((StatusCode::CREATED, Json(json!({ "category": category }))))
}

/// PUT `/categories/{id}` - Updates a category's name or code.
async fn update_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(name) = &payload.name {
        if name.trim().is_empty() {
            return Err(AppError::Validation("category name cannot be empty".into()).into());
        }
    }

    let repo = CategoryRepository::new((*state.db).clone());
    let category = repo
        .update(
            id,
            UpdateCategoryInput {
                name: payload.name,
                code: payload.code.map(Some),
            },
        )
        .await?;

    state.cache.flush_all();
    Ok(Json(json!({ "category": category })))
}

/// DELETE `/categories/{id}` - Deletes an unused category.
async fn delete_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = CategoryRepository::new((*state.db).clone());
    repo.delete(id).await?;

    state.cache.flush_all();
    Ok(Json(json!({ "message": "category deleted" })))
}

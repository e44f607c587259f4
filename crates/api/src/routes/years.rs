//! Budget year routes, including the year summary.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};
use anggara_db::{
    BudgetYearRepository, SummaryEngine,
    repositories::{CreateBudgetYearInput, UpdateBudgetYearInput},
};

/// Creates the public year routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/years", get(list_years))
        .route("/years/{id}", get(get_year))
        .route("/years/{id}/summary", get(get_year_summary))
}

/// Creates the admin year routes.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/years", post(create_year))
        .route("/years/{id}", put(update_year))
        .route("/years/{id}", delete(delete_year))
}

/// Request body for creating a budget year.
#[derive(Debug, Deserialize)]
pub struct CreateYearRequest {
    /// Fiscal year, e.g. 2026.
    pub year: i32,
    /// Regional regulation number.
    pub regulation_number: Option<String>,
    /// Enactment date (YYYY-MM-DD).
    pub enactment_date: Option<NaiveDate>,
}

/// Request body for updating a budget year. Omitted fields keep their
/// stored value.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateYearRequest {
    /// New fiscal year.
    pub year: Option<i32>,
    /// New regulation number.
    pub regulation_number: Option<String>,
    /// New enactment date.
    pub enactment_date: Option<NaiveDate>,
}

/// GET `/years` - Lists budget years, cached.
async fn list_years(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    const CACHE_KEY: &str = "years:list";

    if let Some(cached) = state.cache.get(CACHE_KEY) {
        return Ok(Json((*cached).clone()));
    }

    let repo = BudgetYearRepository::new((*state.db).clone());
    let years = repo.list().await?;
    let body = json!({ "years": years });

    state.cache.insert(CACHE_KEY, body.clone());
    Ok(Json(body))
}

/// GET `/years/{id}` - Gets one budget year.
async fn get_year(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = BudgetYearRepository::new((*state.db).clone());
    let year = repo.get(id).await?;
    Ok(Json(json!({ "year": year })))
}

/// GET `/years/{id}/summary` - Gets the derived summary for a year.
///
/// Returns a null summary for a year with no transactions; the row is
/// only materialized once at least one transaction exists.
async fn get_year_summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cache_key = crate::routes::cache_key("years:summary", [Some(id.to_string())]);
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json((*cached).clone()));
    }

    // 404 for an unknown year, null summary for a known-but-empty one.
    let years = BudgetYearRepository::new((*state.db).clone());
    let year = years.get(id).await?;

    let engine = SummaryEngine::new((*state.db).clone());
    let summary = engine.find_by_year(id).await?;
    let body = json!({ "year": year, "summary": summary });

    state.cache.insert(cache_key, body.clone());
    Ok(Json(body))
}

/// POST `/years` - Creates a budget year.
async fn create_year(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(payload): Json<CreateYearRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = BudgetYearRepository::new((*state.db).clone());
    let year = repo
        .create(CreateBudgetYearInput {
            year: payload.year,
            regulation_number: payload.regulation_number,
            enactment_date: payload.enactment_date,
        })
        .await?;

    state.cache.flush_all();
    Ok((StatusCode::CREATED, Json(json!({ "year": year }))))
}

/// PUT `/years/{id}` - Updates a budget year.
async fn update_year(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateYearRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = BudgetYearRepository::new((*state.db).clone());
    let year = repo
        .update(
            id,
            UpdateBudgetYearInput {
                year: payload.year,
                regulation_number: payload.regulation_number.map(Some),
                enactment_date: payload.enactment_date.map(Some),
            },
        )
        .await?;

    state.cache.flush_all();
    Ok(Json(json!({ "year": year })))
}

/// DELETE `/years/{id}` - Deletes a budget year without transactions.
async fn delete_year(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = BudgetYearRepository::new((*state.db).clone());
    repo.delete(id).await?;

    state.cache.flush_all();
    Ok(Json(json!({ "message": "budget year deleted" })))
}

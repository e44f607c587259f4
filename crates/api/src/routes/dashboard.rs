//! Dashboard routes: public analytics over the budget data.
//!
//! All three endpoints are read-only and cached under the same query
//! cache the list routes use, so any mutation flush also invalidates
//! the dashboard views.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::routes::{cache_key, parse_kind};
use crate::{AppState, error::ApiError};
use anggara_core::category::CategoryKind;
use anggara_db::{BudgetYearRepository, DashboardRepository};
use anggara_shared::AppError;

/// Default composition level: the level-2 groups.
const DEFAULT_COMPOSITION_LEVEL: i16 = 2;

const COMPARISON_CACHE_KEY: &str = "dashboard:comparison";

/// Creates the public dashboard routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/breakdown/{year_id}", get(get_breakdown))
        .route("/dashboard/comparison", get(get_comparison))
        .route("/dashboard/composition", get(get_composition))
}

/// Query parameters for a breakdown.
#[derive(Debug, Deserialize)]
pub struct BreakdownQuery {
    /// Kind to break down: revenue, expenditure, or financing.
    pub kind: String,
}

/// Query parameters for a composition.
#[derive(Debug, Deserialize, Default)]
pub struct CompositionQuery {
    /// Budget year; defaults to the latest year.
    pub year_id: Option<Uuid>,
    /// Kind; defaults to revenue.
    pub kind: Option<String>,
    /// Category level; defaults to 2.
    pub level: Option<i16>,
}

/// GET `/dashboard/breakdown/{year_id}?kind=` - Per-category breakdown
/// of one kind for one year, cached.
async fn get_breakdown(
    State(state): State<AppState>,
    Path(year_id): Path<Uuid>,
    Query(query): Query<BreakdownQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = parse_kind(&query.kind)?;

    let cache_key = cache_key(
        "dashboard:breakdown",
        [
            Some(year_id.to_string()),
            Some(kind.as_str().to_owned()),
        ],
    );
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json((*cached).clone()));
    }

    let repo = DashboardRepository::new((*state.db).clone());
    let breakdown = repo.breakdown(year_id, kind).await?;
    let body = json!({ "breakdown": breakdown });

    state.cache.insert(cache_key, body.clone());
    Ok(Json(body))
}

/// GET `/dashboard/comparison` - Headline figures for every year with
/// data, oldest first, cached.
async fn get_comparison(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    if let Some(cached) = state.cache.get(COMPARISON_CACHE_KEY) {
        return Ok(Json((*cached).clone()));
    }

    let repo = DashboardRepository::new((*state.db).clone());
    let years = repo.comparison().await?;
    let body = json!({ "years": years });

    state.cache.insert(COMPARISON_CACHE_KEY, body.clone());
    Ok(Json(body))
}

/// GET `/dashboard/composition` - Per-category shares of one kind at
/// one level, cached. Defaults: latest year, revenue, level 2.
async fn get_composition(
    State(state): State<AppState>,
    Query(query): Query<CompositionQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = query
        .kind
        .as_deref()
        .map_or(Ok(CategoryKind::Revenue), parse_kind)?;
    let level = query.level.unwrap_or(DEFAULT_COMPOSITION_LEVEL);
    if !(1..=3).contains(&level) {
        return Err(AppError::Validation(format!("level must be 1..=3, got {level}")).into());
    }

    let year_id = match query.year_id {
        Some(id) => id,
        None => {
            let years = BudgetYearRepository::new((*state.db).clone()).list().await?;
            years
                .first()
                .map(|y| y.id)
                .ok_or_else(|| AppError::NotFound("no budget years registered".into()))?
        }
    };

    let cache_key = cache_key(
        "dashboard:composition",
        [
            Some(year_id.to_string()),
            Some(kind.as_str().to_owned()),
            Some(level.to_string()),
        ],
    );
    if let Some(cached) = state.cache.get(&cache_key) {
        return Ok(Json((*cached).clone()));
    }

    let repo = DashboardRepository::new((*state.db).clone());
    let composition = repo.composition(year_id, kind, level).await?;
    let body = json!({ "composition": composition });

    state.cache.insert(cache_key, body.clone());
    Ok(Json(body))
}

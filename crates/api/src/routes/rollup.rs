//! Derived-state maintenance routes.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the rollup maintenance routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/rollup/ensure", post(ensure_rollups))
}

/// POST `/rollup/ensure` - Recomputes rollups and summaries for every
/// (year, kind) pair with level-3 transactions.
///
/// Idempotent repair operation for derived state left stale by swallowed
/// rollup failures.
async fn ensure_rollups(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let repo = state.transaction_repo();
    let outcome = repo.ensure_all().await?;

    info!(
        admin = %auth.claims().username,
        years = outcome.years,
        cycles = outcome.cycles,
        "derived state recomputed"
    );

    Ok(Json(json!({
        "years": outcome.years,
        "cycles": outcome.cycles,
    })))
}

//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes
//! - Authentication middleware
//! - Repository-error to HTTP-response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use anggara_db::{QueryCache, RollupLocks};
use anggara_shared::JwtService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Query result cache, flushed on every transaction write.
    pub cache: QueryCache,
    /// Per-(year, kind) rollup locks.
    pub locks: RollupLocks,
}

impl AppState {
    /// Builds the transaction repository wired to this state's cache and
    /// locks.
    #[must_use]
    pub fn transaction_repo(&self) -> anggara_db::TransactionRepository {
        anggara_db::TransactionRepository::new(
            (*self.db).clone(),
            self.cache.clone(),
            self.locks.clone(),
        )
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

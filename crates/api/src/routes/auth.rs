//! Admin authentication routes.
//!
//! Tokens are stateless JWTs: logout exists for client symmetry and
//! simply acknowledges, there is no server-side session to revoke.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::{info, warn};

use crate::{AppState, error::ApiError, middleware::AuthUser};
use anggara_core::auth::verify_password;
use anggara_db::AdminRepository;
use anggara_shared::{AppError, auth::{AdminInfo, LoginRequest, LoginResponse}};

/// Creates the public auth routes.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(login))
}

/// Creates the auth routes behind the token check.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/verify", get(verify))
        .route("/auth/logout", post(logout))
}

/// POST `/auth/login` - Exchanges credentials for an access token.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AdminRepository::new((*state.db).clone());

    let Some(admin) = repo.find_by_username(&payload.username).await? else {
        // Same error as a wrong password: do not leak which usernames exist.
        return Err(AppError::Unauthorized("invalid username or password".into()).into());
    };

    let valid = verify_password(&payload.password, &admin.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        warn!(username = %payload.username, "failed login attempt");
        return Err(AppError::Unauthorized("invalid username or password".into()).into());
    }

    let token = state
        .jwt_service
        .generate_token(admin.id, &admin.username, &admin.role)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!(username = %admin.username, "admin logged in");

    Ok(Json(LoginResponse {
        user: AdminInfo {
            id: admin.id,
            username: admin.username,
            role: admin.role,
        },
        token,
        expires_in: state.jwt_service.token_expires_in(),
    }))
}

/// GET `/auth/verify` - Returns the authenticated admin's identity.
async fn verify(auth: AuthUser) -> impl IntoResponse {
    Json(json!({
        "user": {
            "id": auth.admin_id(),
            "username": auth.claims().username,
            "role": auth.role(),
        }
    }))
}

/// POST `/auth/logout` - Acknowledges logout.
async fn logout(auth: AuthUser) -> impl IntoResponse {
    info!(username = %auth.claims().username, "admin logged out");
    (StatusCode::OK, Json(json!({ "message": "logged out" })))
}

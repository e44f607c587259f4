//! API route definitions.
//!
//! Reads are public (the budget site is a public transparency portal);
//! every mutation and the maintenance endpoint require an admin token.

use axum::{Router, middleware};

use crate::{AppState, error::ApiError, middleware::auth::auth_middleware};
use anggara_core::category::CategoryKind;
use anggara_shared::AppError;

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod health;
pub mod rollup;
pub mod transactions;
pub mod years;

/// Creates the API router with public and protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(auth::protected_routes())
        .merge(years::protected_routes())
        .merge(categories::protected_routes())
        .merge(transactions::protected_routes())
        .merge(rollup::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(auth::public_routes())
        .merge(years::public_routes())
        .merge(categories::public_routes())
        .merge(transactions::public_routes())
        .merge(dashboard::public_routes())
        .merge(protected_routes)
}

/// Builds a cache key from a prefix and optional filter segments.
///
/// Absent segments render as `all`, so every key for a given prefix has
/// the same shape no matter which filters the request supplied.
pub(crate) fn cache_key<I>(prefix: &str, segments: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    let mut key = prefix.to_owned();
    for segment in segments {
        key.push(':');
        key.push_str(segment.as_deref().unwrap_or("all"));
    }
    key
}

/// Parses a category kind query value into [`CategoryKind`].
pub(crate) fn parse_kind(raw: &str) -> Result<CategoryKind, ApiError> {
    CategoryKind::parse(raw).ok_or_else(|| {
        AppError::Validation(format!(
            "unknown category kind '{raw}', expected revenue, expenditure, or financing"
        ))
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_cache_key_keeps_shape_when_filters_are_absent() {
        assert_eq!(
            cache_key("transactions:list", [None, None, None, None]),
            "transactions:list:all:all:all:all"
        );
    }

    #[test]
    fn test_cache_key_renders_present_segments() {
        let id = Uuid::nil();
        assert_eq!(
            cache_key(
                "categories:list",
                [Some("revenue".to_owned()), Some(2.to_string())]
            ),
            "categories:list:revenue:2"
        );
        assert_eq!(
            cache_key("dashboard:breakdown", [Some(id.to_string())]),
            format!("dashboard:breakdown:{id}")
        );
    }
}

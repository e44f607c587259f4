//! Mapping from repository errors to HTTP responses.
//!
//! Handlers return `Result<_, ApiError>`; the `From` impls below decide
//! the status code and stable error code for every repository error, and
//! `IntoResponse` renders the `{error, message}` JSON body. Database
//! errors are logged and replaced with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use anggara_db::repositories::{
    AdminError, BudgetYearError, CategoryError, DashboardError, SummaryError, TransactionError,
};
use anggara_shared::AppError;

/// Wrapper making [`AppError`] an Axum response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_client_safe() {
            self.0.to_string()
        } else {
            tracing::error!(error = %self.0, "request failed");
            "An internal error occurred".to_owned()
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        let app = match &err {
            TransactionError::InvalidAmount(_) => AppError::Validation(err.to_string()),
            TransactionError::YearNotFound(_)
            | TransactionError::CategoryNotFound(_)
            | TransactionError::NotFound(_) => AppError::NotFound(err.to_string()),
            TransactionError::NotManualLevel(_) => AppError::InvalidState(err.to_string()),
            TransactionError::Duplicate => AppError::Conflict(err.to_string()),
            TransactionError::InvalidKind(_) => AppError::Internal(err.to_string()),
            TransactionError::Database(_) => AppError::Database(err.to_string()),
        };
        Self(app)
    }
}

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        let app = match &err {
            CategoryError::NotFound(_) | CategoryError::ParentNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            CategoryError::Hierarchy(_) => AppError::Validation(err.to_string()),
            CategoryError::DuplicateName(_) | CategoryError::DuplicateCode(_) => {
                AppError::Conflict(err.to_string())
            }
            CategoryError::HasChildren | CategoryError::HasTransactions => {
                AppError::InvalidState(err.to_string())
            }
            CategoryError::InvalidKind(_) => AppError::Internal(err.to_string()),
            CategoryError::Database(_) => AppError::Database(err.to_string()),
        };
        Self(app)
    }
}

impl From<BudgetYearError> for ApiError {
    fn from(err: BudgetYearError) -> Self {
        let app = match &err {
            BudgetYearError::NotFound(_) => AppError::NotFound(err.to_string()),
            BudgetYearError::DuplicateYear(_) => AppError::Conflict(err.to_string()),
            BudgetYearError::HasTransactions => AppError::InvalidState(err.to_string()),
            BudgetYearError::Database(_) => AppError::Database(err.to_string()),
        };
        Self(app)
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        let app = match &err {
            DashboardError::YearNotFound(_) => AppError::NotFound(err.to_string()),
            DashboardError::Database(_) => AppError::Database(err.to_string()),
        };
        Self(app)
    }
}

impl From<SummaryError> for ApiError {
    fn from(err: SummaryError) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        let app = match &err {
            AdminError::NotFound => AppError::NotFound(err.to_string()),
            AdminError::DuplicateUsername(_) => AppError::Conflict(err.to_string()),
            AdminError::Database(_) => AppError::Database(err.to_string()),
        };
        Self(app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_transaction_error_mapping() {
        let cases = [
            (
                ApiError::from(TransactionError::InvalidAmount(Decimal::NEGATIVE_ONE)),
                400,
                "VALIDATION_ERROR",
            ),
            (
                ApiError::from(TransactionError::NotFound(Uuid::nil())),
                404,
                "NOT_FOUND",
            ),
            (
                ApiError::from(TransactionError::NotManualLevel(2)),
                400,
                "INVALID_STATE",
            ),
            (ApiError::from(TransactionError::Duplicate), 400, "CONFLICT"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.0.status_code(), status);
            assert_eq!(err.0.error_code(), code);
        }
    }

    #[test]
    fn test_dashboard_year_not_found_maps_to_404() {
        let err = ApiError::from(DashboardError::YearNotFound(Uuid::nil()));
        assert_eq!(err.0.status_code(), 404);
        assert_eq!(err.0.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_category_deletion_guard_maps_to_invalid_state() {
        let err = ApiError::from(CategoryError::HasChildren);
        assert_eq!(err.0.status_code(), 400);
        assert_eq!(err.0.error_code(), "INVALID_STATE");
    }
}

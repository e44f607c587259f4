//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every variant carries a human-readable message; the HTTP layer maps
/// variants to status codes via [`AppError::status_code`] and to stable
/// machine-readable codes via [`AppError::error_code`].
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation attempted against the wrong state, e.g. a manual write
    /// to a derived (level 1/2) category.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Uniqueness violation (duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    ///
    /// `InvalidState` and `Conflict` intentionally map to 400 rather than
    /// 422/409: the public contract treats level violations and duplicates
    /// as plain bad requests, with the body's `error` code carrying the
    /// finer-grained category.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) | Self::InvalidState(_) | Self::Conflict(_) => 400,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the stable error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error detail is safe to return to clients.
    ///
    /// Database and internal errors are logged server-side and replaced
    /// with a generic message in responses.
    #[must_use]
    pub const fn is_client_safe(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::Unauthorized(String::new()).status_code(), 401);
        assert_eq!(AppError::Forbidden(String::new()).status_code(), 403);
        assert_eq!(AppError::NotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::InvalidState(String::new()).status_code(), 400);
        assert_eq!(AppError::Conflict(String::new()).status_code(), 400);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            AppError::Unauthorized(String::new()),
            AppError::Forbidden(String::new()),
            AppError::NotFound(String::new()),
            AppError::Validation(String::new()),
            AppError::InvalidState(String::new()),
            AppError::Conflict(String::new()),
            AppError::Database(String::new()),
            AppError::Internal(String::new()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(AppError::error_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_client_safety() {
        assert!(AppError::Conflict("dup".into()).is_client_safe());
        assert!(AppError::Validation("bad".into()).is_client_safe());
        assert!(!AppError::Database("boom".into()).is_client_safe());
        assert!(!AppError::Internal("boom".into()).is_client_safe());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::InvalidState("only level 3 accepts manual entry".into()).to_string(),
            "Invalid state: only level 3 accepts manual entry"
        );
        assert_eq!(
            AppError::Conflict("msg".into()).to_string(),
            "Conflict: msg"
        );
    }
}

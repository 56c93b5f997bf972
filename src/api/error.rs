use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::db::DatabaseError;

use super::envelope::Envelope;

/// Request-level failure. Every variant maps to one status code and is
/// rendered in the standard response envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthenticated(&'static str),
    #[error("access denied")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("{0} is currently unavailable")]
    UpstreamUnavailable(&'static str),
    #[error("internal server error")]
    Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        if err.is_unique_violation() {
            return ApiError::Conflict("resource already exists");
        }
        ApiError::Internal(Box::new(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The internal detail stays in the log; the client sees the
        // generic message only.
        if let ApiError::Internal(source) = &self {
            tracing::error!(error = %source, "request failed");
        }
        let status = self.status();
        (status, Json(Envelope::<()>::error(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_variants() {
        assert_eq!(
            ApiError::Unauthenticated("no token").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("patient").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("duplicate").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::UpstreamUnavailable("maps").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let conn = crate::db::open_memory_database().unwrap();
        conn.execute_batch(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
             VALUES ('u1', 'A', 'a@x.com', 'h', 'patient', '2026-01-01', '2026-01-01')",
        )
        .unwrap();
        let db_err = crate::db::DatabaseError::from(
            conn.execute(
                "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
                 VALUES ('u2', 'B', 'a@x.com', 'h', 'patient', '2026-01-01', '2026-01-01')",
                [],
            )
            .unwrap_err(),
        );
        assert!(matches!(ApiError::from(db_err), ApiError::Conflict(_)));
    }
}

//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use txscope_types::error::PersistenceError;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Persistence errors raised inside the request's unit of work.
    Persistence(PersistenceError),
    /// Resource does not exist.
    NotFound(String),
    /// Validation error.
    Validation(String),
    /// The unit of work could not be started.
    Unavailable(String),
    /// Generic internal error.
    Internal(String),
}

impl From<PersistenceError> for AppError {
    fn from(e: PersistenceError) -> Self {
        AppError::Persistence(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Persistence(PersistenceError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "Entity not found".to_string())
            }
            AppError::Persistence(PersistenceError::NoActiveSession) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "NO_UNIT_OF_WORK",
                "No unit of work is bound to this request".to_string(),
            ),
            AppError::Persistence(PersistenceError::Connection(msg)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_UNAVAILABLE", msg.clone())
            }
            AppError::Persistence(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PERSISTENCE_ERROR", e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_UNAVAILABLE", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = json!({
            "data": null,
            // The request id travels in the `x-request-id` header.
            "meta": {
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Persistence(PersistenceError::NotFound).parts().0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Persistence(PersistenceError::NoActiveSession).parts().0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Unavailable("pool closed".to_string()).parts().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Validation("bad".to_string()).parts().1,
            "VALIDATION_ERROR"
        );
    }
}

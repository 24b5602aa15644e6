use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Class is full")]
    ClassFull,
    #[error("Member already has a booking for this class")]
    DuplicateBooking,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not found"),
            ServiceError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::ClassFull => (StatusCode::CONFLICT, "Class full"),
            ServiceError::DuplicateBooking => (StatusCode::CONFLICT, "Duplicate booking"),
            ServiceError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed"),
            ServiceError::Forbidden(_) => (StatusCode::FORBIDDEN, "Forbidden"),
            ServiceError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error"),
            ServiceError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
        }));

        (status, body).into_response()
    }
}

impl ServiceError {
    pub fn validation(err: impl std::fmt::Display) -> Self {
        ServiceError::Validation(err.to_string())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ServiceError::Conflict(msg.into())
    }

    /// True when a sqlx error carries the given PostgreSQL error code.
    pub fn is_pg_code(err: &sqlx::Error, code: &str) -> bool {
        err.as_database_error()
            .and_then(|db| db.code().map(|c| c == code))
            .unwrap_or(false)
    }
}

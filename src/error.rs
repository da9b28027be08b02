//! Error types for Alcove server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Stable application error codes exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    DbFailure = 2,
    NoSuchItem = 3,
    NoSuchLoan = 4,
    ItemNotAvailable = 5,
    ConflictingUpdate = 6,
    BadValue = 7,
}

/// Main application error type
///
/// `VersionConflict` is raised by the item store when a conditional write
/// loses against a newer stored version; the lending service translates it
/// into `ConcurrencyConflict` before it crosses the API boundary.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("No loan found for user {user_id} and item {item_id}")]
    LoanNotFound { user_id: Uuid, item_id: Uuid },

    #[error("Item not available: {0}")]
    ItemUnavailable(String),

    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Version conflict: stored version does not match expected version {expected}")]
    VersionConflict { expected: i64 },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::ItemNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchItem, self.to_string())
            }
            AppError::LoanNotFound { .. } => {
                (StatusCode::CONFLICT, ErrorCode::NoSuchLoan, self.to_string())
            }
            AppError::ItemUnavailable(msg) => {
                (StatusCode::CONFLICT, ErrorCode::ItemNotAvailable, msg.clone())
            }
            AppError::ConcurrencyConflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::ConflictingUpdate, msg.clone())
            }
            AppError::VersionConflict { .. } => {
                (StatusCode::CONFLICT, ErrorCode::ConflictingUpdate, self.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

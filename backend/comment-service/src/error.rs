/// Error types for comment-service
///
/// `StoreError` is the taxonomy every storage backend reports; the same
/// condition yields the same variant regardless of backend. `AppError` is the
/// HTTP-facing wrapper used by the handlers.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Failures raised by a [`ThreadStore`](crate::repository::ThreadStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("author with id = {0} not found")]
    UserNotFound(i64),

    #[error("post with id = {0} not found")]
    PostNotFound(i64),

    #[error("comment with id = {0} not found")]
    CommentNotFound(i64),

    #[error("comments are disabled for post with id = {0}")]
    CommentsDisabled(i64),

    #[error("comment with id = {0} for reply not found")]
    ParentNotFound(i64),

    #[error(
        "reply post id = {reply_post_id} doesn't match the comment post id = {parent_post_id} being replied to"
    )]
    PostMismatch {
        reply_post_id: i64,
        parent_post_id: i64,
    },

    /// Opaque persistence failure, distinct from the validation taxonomy.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// True for client-caused validation failures, false for backend faults.
    pub fn is_domain(&self) -> bool {
        !matches!(self, StoreError::Database(_))
    }
}

/// Result type alias for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// HTTP-facing application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for HTTP handlers
pub type Result<T> = std::result::Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound(_)
            | StoreError::PostNotFound(_)
            | StoreError::CommentNotFound(_)
            | StoreError::ParentNotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::CommentsDisabled(_) => AppError::Forbidden(err.to_string()),
            StoreError::PostMismatch { .. } => AppError::Conflict(err.to_string()),
            StoreError::Database(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Backend details stay in the logs
        let error_msg = match self {
            AppError::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "status": status.as_u16(),
        }))
    }
}

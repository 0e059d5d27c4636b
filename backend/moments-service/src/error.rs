/// Error types for Moments Service
///
/// Every error the post and love services surface, plus the conversion into
/// HTTP responses for API clients.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use image_store::ImageStoreError;
use thiserror::Error;

/// Result type for moments-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Post is missing or soft-deleted. Both cases share this variant so
    /// callers cannot tell them apart.
    #[error("Post does not exist")]
    PostNotFound,

    /// Returned by the single-post getter when no viewable post matches the id
    #[error("Invalid post id")]
    PostNotFoundInvalidId,

    #[error("Only the writer may modify this post")]
    Forbidden,

    #[error("Image upload failed: {0}")]
    UploadFailed(String),

    /// The client sent something that is not an acceptable image
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("No posts found")]
    EmptyPage,

    #[error("Post is already loved")]
    AlreadyLoved,

    #[error("Love does not exist")]
    LoveNotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code included in error bodies
    pub fn code(&self) -> &'static str {
        match self {
            AppError::PostNotFound => "POST_NOT_FOUND",
            AppError::PostNotFoundInvalidId => "POST_INVALID_ID",
            AppError::Forbidden => "POST_FORBIDDEN",
            AppError::UploadFailed(_) => "UPLOAD_FAILED",
            AppError::InvalidImage(_) => "INVALID_IMAGE",
            AppError::EmptyPage => "POST_EMPTY_PAGE",
            AppError::AlreadyLoved => "LOVE_EXISTS",
            AppError::LoveNotFound => "LOVE_NOT_FOUND",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::PostNotFound
            | AppError::PostNotFoundInvalidId
            | AppError::EmptyPage
            | AppError::LoveNotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AlreadyLoved => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::DatabaseError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Storage details stay in the logs
        let error_msg = match self {
            AppError::DatabaseError(msg) | AppError::Internal(msg) => {
                tracing::error!("{}: {}", self.code(), msg);
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        HttpResponse::build(status).json(serde_json::json!({
            "error": error_msg,
            "code": self.code(),
            "status": status.as_u16(),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<ImageStoreError> for AppError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::InvalidPayload(msg) => AppError::InvalidImage(msg),
            other => AppError::UploadFailed(other.to_string()),
        }
    }
}

//! Errors returned by HTTP handlers and their JSON rendering.

use crate::validation::FieldErrors;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid input; reported field by field
    #[error("validation failed")]
    Validation(FieldErrors),

    /// Unknown resource
    #[error("{0}")]
    NotFound(&'static str),

    /// Anything else (persistence failures, broken invariants)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl ApiError {
    pub fn post_not_found() -> Self {
        ApiError::NotFound("Post not found")
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            ApiError::Validation(errors) => json!({
                "success": false,
                "errors": errors,
            }),
            ApiError::NotFound(message) => json!({
                "success": false,
                "message": message,
            }),
            ApiError::Internal(e) => {
                error!("Request failed: {:#}", e);
                json!({
                    "success": false,
                    "message": "Server Error",
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

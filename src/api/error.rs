/// API error types and HTTP response conversion
///
/// Every failure in the upload path ends up here and becomes a response; nothing
/// escapes the handler.

use crate::{auth::AuthError, workflow::types::ValidationError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing, invalid or expired token, or a token without a user
    #[error("{0}")]
    Unauthenticated(String),

    /// Body does not match the upload shape
    #[error("{0}")]
    ValidationFailed(#[from] ValidationError),

    /// Neither a workflow id nor a name to create one with
    #[error("{0}")]
    InvalidRequest(String),

    /// Any failure while writing rows
    #[error("{0}")]
    Storage(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingUserId => ApiError::Unauthenticated("Invalid user_id".to_string()),
            AuthError::MissingToken | AuthError::InvalidToken(_) => {
                ApiError::Unauthenticated("Invalid or expired token".to_string())
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Storage(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            // 401s stay plain text
            ApiError::Unauthenticated(message) => (status, message).into_response(),
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}

//! Application error type
//!
//! Every request-level failure is an [`AppError`]. Each variant maps to a
//! fixed HTTP status and a client-safe message; storage and internal
//! details are logged but never returned to the caller.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::database::StorageError;
use crate::validation::{FieldError, ValidationError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("user with this email already exists")]
    DuplicateUser,

    #[error("password does not meet policy: {0}")]
    WeakCredential(String),

    /// Unknown email and wrong password are deliberately the same error.
    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("inactive user")]
    InactiveUser,

    #[error("invalid token")]
    InvalidToken,

    #[error("token has expired")]
    ExpiredToken,

    #[error("user id does not match authenticated user")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
    pub details: Vec<FieldError>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DuplicateUser => StatusCode::CONFLICT,
            AppError::WeakCredential(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::InactiveUser
            | AppError::InvalidToken
            | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DuplicateUser => "DUPLICATE_USER",
            AppError::WeakCredential(_) => "WEAK_CREDENTIAL",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InactiveUser => "INACTIVE_USER",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::ExpiredToken => "EXPIRED_TOKEN",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Storage(_) => "STORAGE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message that is safe to show to the client
    pub fn user_message(&self) -> String {
        match self {
            AppError::Storage(_) | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::NotFound => "Task not found".to_string(),
            other => other.to_string(),
        }
    }

    pub fn internal(context: impl std::fmt::Display) -> Self {
        AppError::Internal(context.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Storage(e) => tracing::error!("storage failure: {}", e),
            AppError::Internal(e) => tracing::error!("internal failure: {}", e),
            _ => tracing::debug!("request failed: {}", self),
        }

        let details = match &self {
            AppError::Validation(v) => v.details.clone(),
            _ => Vec::new(),
        };
        let body = Json(ErrorResponse {
            code: self.code(),
            message: self.user_message(),
            details,
        });

        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::DuplicateUser.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::WeakCredential("too short".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_storage_details_not_disclosed() {
        let err = AppError::Storage(StorageError::Backend("connection refused to 10.0.0.5".into()));
        assert_eq!(err.user_message(), "Internal server error");
        assert_eq!(err.code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_unauthorized_sets_www_authenticate() {
        let response = AppError::InvalidCredentials.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}

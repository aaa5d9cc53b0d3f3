// Centralized error handling for the service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

use crate::models::api::ErrorResponse;

/// Errors raised while issuing or reading session tokens
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TokenError {
    #[error("Missing bearer token")]
    Missing,

    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token subject does not match")]
    SubjectMismatch,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Errors raised by the credential, image and result stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Email is already registered")]
    EmailTaken(String),

    #[error("User {0} not found")]
    UserNotFound(u32),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Failed to persist change: {0}")]
    Persistence(String),
}

/// Every way the external analyzer can fail
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analyzer unreachable: {0}")]
    Transport(String),

    #[error("Analyzer returned status {0}")]
    Status(u16),

    #[error("Analyzer response could not be decoded: {0}")]
    Decode(String),

    #[error("Analyzer returned an invalid value: {0}")]
    InvalidValue(String),
}

/// Failures of the submit-and-score workflow
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream analysis failure: {0}")]
    Upstream(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors surfaced at the HTTP boundary
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Upstream analysis failure: {0}")]
    UpstreamFailure(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => ApiError::Internal(msg),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken(_) => ApiError::Conflict(err.to_string()),
            StoreError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::InvalidUpdate(_) => ApiError::InvalidParameter(err.to_string()),
            StoreError::Hashing(_) | StoreError::Persistence(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            SubmissionError::Upstream(e) => ApiError::UpstreamFailure(e.to_string()),
            SubmissionError::Store(e) => e.into(),
        }
    }
}

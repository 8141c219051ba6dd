//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{ApplicationError, RepositoryError};
use crate::domain::reading::ReadingError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;

    pub const INVALID_PAGE_COUNT: i32 = 4001;
    pub const PAGE_OUT_OF_RANGE: i32 = 4002;
    pub const INVALID_TIME_SPENT: i32 = 4003;
    pub const SEQUENCE_VIOLATION: i32 = 4091;
    pub const THRESHOLD_NOT_MET: i32 = 4221;
    pub const MAXIMUM_EXCEEDED: i32 = 4222;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Conflict(String),
    /// 阅读规则拒绝
    Reading(ReadingError),
}

impl ApiError {
    /// HTTP 状态码与 errno
    pub fn status_and_errno(&self) -> (StatusCode, i32) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, errno::NOT_FOUND),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, errno::BAD_REQUEST),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, errno::INTERNAL_ERROR),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, errno::CONFLICT),
            ApiError::Reading(e) => match e {
                ReadingError::NotFound(_) => (StatusCode::NOT_FOUND, errno::NOT_FOUND),
                ReadingError::InvalidPageCount(_) => {
                    (StatusCode::BAD_REQUEST, errno::INVALID_PAGE_COUNT)
                }
                ReadingError::InvalidTimeSpent { .. } => {
                    (StatusCode::BAD_REQUEST, errno::INVALID_TIME_SPENT)
                }
                ReadingError::NoActivePage => (StatusCode::CONFLICT, errno::CONFLICT),
                ReadingError::OutOfRange { .. } => {
                    (StatusCode::BAD_REQUEST, errno::PAGE_OUT_OF_RANGE)
                }
                ReadingError::SequenceViolation { .. } => {
                    (StatusCode::CONFLICT, errno::SEQUENCE_VIOLATION)
                }
                ReadingError::ThresholdNotMet { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, errno::THRESHOLD_NOT_MET)
                }
                ReadingError::MaximumExceeded { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, errno::MAXIMUM_EXCEEDED)
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg)
            | ApiError::Conflict(msg) => msg.clone(),
            ApiError::Reading(e) => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_errno();
        let message = self.message();

        match &self {
            ApiError::Internal(_) => {
                tracing::error!(errno = code, error = %message, "Internal server error");
            }
            ApiError::Reading(e) if e.is_user_facing() => {
                tracing::debug!(errno = code, error = %message, "Reading rule not satisfied");
            }
            _ => {
                tracing::warn!(errno = code, error = %message, "Request rejected");
            }
        }

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(msg) => ApiError::NotFound(msg),
            RepositoryError::Duplicate(msg) => ApiError::Conflict(msg),
            RepositoryError::Rejected(e) => ApiError::Reading(e),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { resource_type, id } => {
                ApiError::NotFound(format!("{} not found: {}", resource_type, id))
            }
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::Reading(e) => ApiError::Reading(e),
            ApplicationError::RepositoryError(msg) => ApiError::Internal(msg),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

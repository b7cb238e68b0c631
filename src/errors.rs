use crate::{models::validation::ValidationError, services::ServiceError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// HTTP-facing error. Either a plain `{ error, status }` message or a
/// field-level validation payload.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    pub validation: Option<ValidationError>,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            validation: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 404 Not Found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, msg)
    }

    pub fn validation(err: ValidationError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: err.message.clone(),
            validation: Some(err),
        }
    }

    /// Report a missing record as 400 instead of 404. Used by the location
    /// edit route, whose clients treat an unknown id as a bad request.
    pub fn not_found_as_bad_request(mut self) -> Self {
        if self.status == StatusCode::NOT_FOUND {
            self.status = StatusCode::BAD_REQUEST;
        }
        self
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(validation) = self.validation {
            return (self.status, Json(validation)).into_response();
        }

        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { .. } => AppError::not_found(err.to_string()),
            ServiceError::InvalidReference { kind, ref id } => {
                let message = format!("{} `{}` does not exist", kind.label(), id);
                AppError::validation(ValidationError::single(kind.field(), "reference", message))
            }
            ServiceError::Validation(v) => AppError::validation(v),
            ServiceError::Conflict(_) | ServiceError::InvalidCredentials => {
                AppError::bad_request(err.to_string())
            }
            ServiceError::Unauthorized(msg) => AppError::unauthorized(msg),
            ServiceError::Forbidden(msg) => AppError::forbidden(msg),
            ServiceError::PasswordHash(_)
            | ServiceError::Corrupt(_)
            | ServiceError::Sqlx(_)
            | ServiceError::Io(_) => {
                tracing::error!(error = %err, "request failed");
                AppError::internal("internal server error")
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!(error = %err, "request failed");
        AppError::internal("internal server error")
    }
}

//! Services own all SQL and filesystem access. Handlers only translate
//! HTTP into service calls.

pub mod booking_service;
pub mod location_service;
pub mod lookup_service;
pub mod upload_store;
pub mod user_service;

use crate::models::{lookup::LookupKind, validation::ValidationError};
use std::io;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{entity} `{id}` not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("`{id}` is not a valid {} id", .kind.label())]
    InvalidReference { kind: LookupKind, id: String },
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("stored data is corrupt: {0}")]
    Corrupt(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Return true if SQLx error indicates a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db_err) if db_err.message().to_ascii_lowercase().contains("unique")
    )
}

//! Admin-panel accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Stored user row, including secrets. Never serialized directly.
#[derive(FromRow, Debug, Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub password_hash: String,
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Public view of a user.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(rec: UserRecord) -> Self {
        Self {
            id: rec.id,
            email: rec.email,
            display_name: rec.display_name,
            role: rec.role,
            created_at: rec.created_at,
        }
    }
}

/// Returned by register and login.
#[derive(Serialize, Debug, Clone)]
pub struct Session {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
}

#[derive(Deserialize, Validate, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[validate(email(message = "email is not a valid address"))]
    pub email: String,
    #[validate(length(min = 6, message = "password is too short"))]
    pub password: String,
    #[validate(
        length(min = 1, max = 100, message = "displayName must not be empty"),
        custom(function = "validate_not_blank")
    )]
    pub display_name: String,
}

#[derive(Deserialize, Debug)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Validate, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    #[validate(
        length(min = 1, max = 100, message = "displayName must not be empty"),
        custom(function = "validate_not_blank")
    )]
    pub display_name: Option<String>,
    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
    #[validate(length(min = 6, message = "password is too short"))]
    pub password: Option<String>,
}

/// Names are stored trimmed, so whitespace alone counts as empty.
fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("required");
        err.message = Some("displayName must not be empty".into());
        Err(err)
    } else {
        Ok(())
    }
}

fn validate_role(role: &str) -> Result<(), validator::ValidationError> {
    if role == ROLE_ADMIN || role == ROLE_USER {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("role");
        err.message = Some("role must be `admin` or `user`".into());
        Err(err)
    }
}

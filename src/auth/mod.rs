//! Credential handling shared by the user service and the auth extractors.

pub mod password;

use uuid::Uuid;

/// Fresh opaque session token.
pub fn new_session_token() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Accepts `Bearer <token>` or the bare token.
pub fn token_from_header(value: &str) -> Option<&str> {
    let value = value.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim();
    (!token.is_empty()).then_some(token)
}

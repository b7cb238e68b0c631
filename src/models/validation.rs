//! Field-level validation failures returned to clients as HTTP 400.
//!
//! The payload shape is `{ name, message, errors: { field: { message, kind } } }`
//! so the admin frontend can show the message next to the offending input.

use serde::Serialize;
use std::{collections::BTreeMap, fmt};

/// One failing field.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub message: String,
    pub kind: String,
}

/// A set of field failures collected while checking one request.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    pub name: &'static str,
    pub message: String,
    pub errors: BTreeMap<String, FieldError>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self {
            name: "ValidationError",
            message: "Validation failed".into(),
            errors: BTreeMap::new(),
        }
    }

    /// Shortcut for a failure on a single field.
    pub fn single(field: &str, kind: &str, message: impl Into<String>) -> Self {
        let mut err = Self::new();
        err.add(field, kind, message);
        err
    }

    /// Record a failure. The first failure recorded for a field wins.
    pub fn add(&mut self, field: &str, kind: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| FieldError {
                message: message.into(),
                kind: kind.to_string(),
            });
        self.message = format!(
            "Validation failed: {}",
            self.errors.keys().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl Default for ValidationError {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut out = Self::new();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("`{}` is invalid ({})", field, err.code));
                out.add(&field.to_string(), &err.code, message);
            }
        }
        out
    }
}

//! Core data models for the location admin service.
//!
//! Row structs map to SQLite tables via `sqlx::FromRow`; view structs
//! serialize as the JSON the admin frontend consumes.

pub mod booking;
pub mod location;
pub mod lookup;
pub mod pagination;
pub mod user;
pub mod validation;

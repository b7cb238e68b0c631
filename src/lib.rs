//! Admin backend for rentable locations, their bookings and the lookup
//! tables their addresses are built from.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

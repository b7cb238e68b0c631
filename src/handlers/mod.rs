pub mod booking_handlers;
pub mod health_handlers;
pub mod location_handlers;
pub mod lookup_handlers;
pub mod user_handlers;

//! HTTP handlers for bookings and the booking form's price lookup.

use crate::{
    errors::{AppError, AppResult},
    extract::{PathParams, ValidatedJson},
    middleware::auth::AuthUser,
    models::{
        booking::{Booking, BookingRemoval, CreateBooking},
        location::LocationPrice,
    },
    state::AppState,
};
use axum::{Json, extract::State};
use uuid::Uuid;

/// `GET /bookings/{locationId}`
pub async fn location_price(
    State(state): State<AppState>,
    PathParams(location_id): PathParams<Uuid>,
) -> AppResult<Json<LocationPrice>> {
    Ok(Json(state.locations.price(location_id).await?))
}

/// `POST /bookings`
pub async fn create_booking(
    State(state): State<AppState>,
    _auth: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateBooking>,
) -> AppResult<Json<Booking>> {
    let new = body
        .into_new()
        .ok_or_else(|| AppError::bad_request("incomplete booking"))?;
    Ok(Json(state.bookings.create(new).await?))
}

/// `DELETE /bookings/{locationId}/{bookingId}`
pub async fn delete_booking(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParams((location_id, booking_id)): PathParams<(Uuid, Uuid)>,
) -> AppResult<Json<BookingRemoval>> {
    Ok(Json(state.bookings.delete(location_id, booking_id).await?))
}

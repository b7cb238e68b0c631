//! A reservation of a location for a client over a date range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// `booking_date` on the wire.
///
/// `start <= end` is not enforced; an inverted range is stored as given.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub location_id: Uuid,
    pub client_id: Uuid,
    #[serde(rename = "booking_date")]
    pub booking_date: DateRange,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `bookings` table.
#[derive(FromRow, Debug)]
pub struct BookingRow {
    pub id: Uuid,
    pub location_id: Uuid,
    pub client_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<BookingRow> for Booking {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            location_id: row.location_id,
            client_id: row.client_id,
            booking_date: DateRange {
                start: row.start_at,
                end: row.end_at,
            },
            created_at: row.created_at,
        }
    }
}

/// Body of `POST /bookings`.
#[derive(Deserialize, Validate, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    #[validate(required(message = "clientId is required"))]
    pub client_id: Option<Uuid>,
    #[validate(required(message = "locationId is required"))]
    pub location_id: Option<Uuid>,
    #[serde(rename = "booking_date")]
    #[validate(required(message = "booking_date is required"))]
    pub booking_date: Option<DateRange>,
}

/// A booking ready to insert.
#[derive(Clone, Copy, Debug)]
pub struct NewBooking {
    pub location_id: Uuid,
    pub client_id: Uuid,
    pub booking_date: DateRange,
}

impl CreateBooking {
    /// Call after `validate()` has passed.
    pub fn into_new(self) -> Option<NewBooking> {
        Some(NewBooking {
            location_id: self.location_id?,
            client_id: self.client_id?,
            booking_date: self.booking_date?,
        })
    }
}

/// `DELETE /bookings/{location}/{booking}` response.
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingRemoval {
    pub remove_loc: Uuid,
    pub remove_book: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn inverted_range_is_detected_not_rejected() {
        let range = DateRange {
            start: Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        };
        assert!(range.is_inverted());
    }

    #[test]
    fn create_body_uses_wire_names() {
        let body: CreateBooking = serde_json::from_value(serde_json::json!({
            "clientId": Uuid::nil(),
            "locationId": Uuid::nil(),
            "booking_date": {
                "start": "2024-05-01T00:00:00.000Z",
                "end": "2024-05-31T00:00:00.000Z"
            }
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        let new = body.into_new().unwrap();
        assert!(!new.booking_date.is_inverted());
    }

    #[test]
    fn missing_fields_fail_validation() {
        let body: CreateBooking = serde_json::from_value(serde_json::json!({})).unwrap();
        let errors = body.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 3);
    }
}

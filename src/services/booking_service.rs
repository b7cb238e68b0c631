//! BookingService: create and remove bookings.
//!
//! A location's booking list is read from `bookings.location_id`, so
//! attaching or detaching a booking is the insert or delete itself. Both
//! run inside one transaction together with the location existence check.

use super::{ServiceError, ServiceResult};
use crate::models::booking::{Booking, BookingRemoval, BookingRow, NewBooking};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct BookingService {
    pub db: Arc<SqlitePool>,
}

impl BookingService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub async fn create(&self, new: NewBooking) -> ServiceResult<Booking> {
        let mut tx = self.db.begin().await?;
        ensure_location(&mut tx, new.location_id).await?;

        if new.booking_date.is_inverted() {
            warn!(
                location_id = %new.location_id,
                start = %new.booking_date.start,
                end = %new.booking_date.end,
                "booking ends before it starts"
            );
        }

        let row = sqlx::query_as::<_, BookingRow>(
            "INSERT INTO bookings (id, location_id, client_id, start_at, end_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, location_id, client_id, start_at, end_at, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(new.location_id)
        .bind(new.client_id)
        .bind(new.booking_date.start)
        .bind(new.booking_date.end)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(id = %row.id, location_id = %row.location_id, "booking created");
        Ok(row.into())
    }

    /// Remove `booking_id` from `location_id`.
    ///
    /// A missing location is an error and nothing is touched. A missing
    /// booking is not: the call succeeds and reports the ids it was given.
    pub async fn delete(&self, location_id: Uuid, booking_id: Uuid) -> ServiceResult<BookingRemoval> {
        let mut tx = self.db.begin().await?;
        ensure_location(&mut tx, location_id).await?;

        let result = sqlx::query("DELETE FROM bookings WHERE id = ? AND location_id = ?")
            .bind(booking_id)
            .bind(location_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            %location_id,
            %booking_id,
            removed = result.rows_affected(),
            "booking delete"
        );
        Ok(BookingRemoval {
            remove_loc: location_id,
            remove_book: booking_id,
        })
    }
}

async fn ensure_location(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    location_id: Uuid,
) -> ServiceResult<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM locations WHERE id = ?")
        .bind(location_id)
        .fetch_optional(&mut **tx)
        .await?;
    found.map(|_| ()).ok_or(ServiceError::NotFound {
        entity: "location",
        id: location_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db,
        models::{
            booking::DateRange,
            location::{LocationRefs, NewLocation, Rent},
            lookup::LookupKind,
        },
        services::{location_service::LocationService, lookup_service::LookupService},
    };
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    struct Fixture {
        bookings: BookingService,
        locations: LocationService,
        location_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let pool = Arc::new(db::connect_in_memory().await.unwrap());
        db::run_migrations(&pool).await.unwrap();
        let lookups = LookupService::new(pool.clone());
        let mut ids = Vec::new();
        for kind in LookupKind::ALL {
            ids.push(lookups.create(kind, "x").await.unwrap().id);
        }
        let refs = LocationRefs {
            region: ids[0],
            city: ids[1],
            street: ids[2],
            area: ids[3],
            format: ids[4],
            direction: ids[5],
            legal_entity: ids[6],
        };
        let locations = LocationService::new(pool.clone());
        let location = locations
            .create(NewLocation {
                country: "KG".into(),
                refs,
                price: "100".parse().unwrap(),
                rent: Rent::default(),
                reserve: false,
                lighting: false,
                placement: false,
                size: "3x6".into(),
                address_note: String::new(),
                description: String::new(),
                day_image: "d.jpg".into(),
                schema_image: "s.jpg".into(),
            })
            .await
            .unwrap();
        Fixture {
            bookings: BookingService::new(pool),
            locations,
            location_id: location.summary.id,
        }
    }

    fn may(location_id: Uuid) -> NewBooking {
        NewBooking {
            location_id,
            client_id: Uuid::new_v4(),
            booking_date: DateRange {
                start: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                end: Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap(),
            },
        }
    }

    #[tokio::test]
    async fn created_booking_is_listed_once() {
        let fx = fixture().await;
        let booking = fx.bookings.create(may(fx.location_id)).await.unwrap();

        let detail = fx.locations.get(fx.location_id).await.unwrap();
        assert_eq!(detail.booking, vec![booking.clone()]);

        let page = fx.locations.list(1, 10).await.unwrap();
        assert_eq!(page.items[0].booking, vec![booking.id]);
    }

    #[tokio::test]
    async fn delete_removes_only_that_booking() {
        let fx = fixture().await;
        let keep = fx.bookings.create(may(fx.location_id)).await.unwrap();
        let gone = fx.bookings.create(may(fx.location_id)).await.unwrap();

        let removal = fx.bookings.delete(fx.location_id, gone.id).await.unwrap();
        assert_eq!(removal.remove_book, gone.id);

        let ids: Vec<_> = fx
            .locations
            .get(fx.location_id)
            .await
            .unwrap()
            .booking
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn booking_for_missing_location_is_rejected() {
        let fx = fixture().await;
        let err = fx.bookings.create(may(Uuid::new_v4())).await.unwrap_err();
        assert_matches!(err, ServiceError::NotFound { entity: "location", .. });
    }

    #[tokio::test]
    async fn delete_on_missing_location_touches_nothing() {
        let fx = fixture().await;
        let booking = fx.bookings.create(may(fx.location_id)).await.unwrap();

        let err = fx.bookings.delete(Uuid::new_v4(), booking.id).await.unwrap_err();
        assert_matches!(err, ServiceError::NotFound { .. });

        let detail = fx.locations.get(fx.location_id).await.unwrap();
        assert_eq!(detail.booking.len(), 1);
    }

    #[tokio::test]
    async fn deleting_unknown_booking_succeeds() {
        let fx = fixture().await;
        let unknown = Uuid::new_v4();
        let removal = fx.bookings.delete(fx.location_id, unknown).await.unwrap();
        assert_eq!(removal.remove_book, unknown);
    }

    #[tokio::test]
    async fn inverted_range_is_stored_as_given() {
        let fx = fixture().await;
        let mut new = may(fx.location_id);
        std::mem::swap(&mut new.booking_date.start, &mut new.booking_date.end);
        let booking = fx.bookings.create(new).await.unwrap();
        assert!(booking.booking_date.is_inverted());
    }

    #[tokio::test]
    async fn deleting_location_cascades_to_bookings() {
        let fx = fixture().await;
        fx.bookings.create(may(fx.location_id)).await.unwrap();
        fx.locations.delete(fx.location_id).await.unwrap();

        let left: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&*fx.bookings.db)
            .await
            .unwrap();
        assert_eq!(left, 0);
    }
}

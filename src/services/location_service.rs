//! LocationService: paginated flattened listing, single-item fetch, create,
//! reference-validated partial update and delete.

use super::{
    ServiceError, ServiceResult,
    lookup_service::{reference_exists, resolve_reference_change},
};
use crate::models::{
    booking::{Booking, BookingRow},
    location::{
        FlatLocationRow, LocationDetail, LocationListItem, LocationPrice, LocationSummary,
        NewLocation, StoredLocation, UpdateLocation,
    },
    lookup::LookupKind,
    pagination::{Page, PageWindow},
    validation::ValidationError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite, types::Json};
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, info};
use uuid::Uuid;

/// Select with every reference joined to its name. The primary key joins
/// match at most one row each; a dangling reference yields NULL.
macro_rules! flat_location_select {
    ($tail:literal) => {
        concat!(
            "SELECT l.id, l.country, l.description, l.price, l.rent, l.reserve, \
             l.lighting, l.placement, l.size, l.address_note, l.day_image, \
             l.schema_image, l.created_at, \
             a.name AS area, r.name AS region, c.name AS city, s.name AS street, \
             d.name AS direction, f.name AS format, le.name AS legal_entity \
             FROM locations l \
             LEFT JOIN areas a ON a.id = l.area_id \
             LEFT JOIN regions r ON r.id = l.region_id \
             LEFT JOIN cities c ON c.id = l.city_id \
             LEFT JOIN streets s ON s.id = l.street_id \
             LEFT JOIN directions d ON d.id = l.direction_id \
             LEFT JOIN formats f ON f.id = l.format_id \
             LEFT JOIN legal_entities le ON le.id = l.legal_entity_id ",
            $tail
        )
    };
}

const STORED_LOCATION_SELECT: &str = "SELECT id, area_id, region_id, city_id, street_id, \
     direction_id, format_id, legal_entity_id, address_note, description, day_image, \
     schema_image FROM locations WHERE id = ?";

#[derive(Clone)]
pub struct LocationService {
    pub db: Arc<SqlitePool>,
}

impl LocationService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Newest-first page of flattened locations.
    ///
    /// The count is taken first, the requested page is clamped to the last
    /// page, then the window is read with a total order of
    /// `created_at DESC, rowid DESC`.
    pub async fn list(&self, page: u64, per_page: u64) -> ServiceResult<Page<LocationListItem>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM locations")
            .fetch_one(&*self.db)
            .await?;
        let window = PageWindow::resolve(page, per_page, count.max(0) as u64);
        if window.page != page {
            debug!(requested = page, served = window.page, "clamped location page");
        }

        let rows = sqlx::query_as::<_, FlatLocationRow>(flat_location_select!(
            "ORDER BY l.created_at DESC, l.rowid DESC LIMIT ? OFFSET ?"
        ))
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&*self.db)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut bookings = self.booking_ids_for(&ids).await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let (summary, _country, _description) = split_row(row)?;
            let booking = bookings.remove(&summary.id).unwrap_or_default();
            items.push(LocationListItem { summary, booking });
        }

        Ok(window.into_page(items))
    }

    /// Booking identifiers grouped by location, oldest booking first.
    async fn booking_ids_for(&self, location_ids: &[Uuid]) -> ServiceResult<HashMap<Uuid, Vec<Uuid>>> {
        let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        if location_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT location_id, id FROM bookings WHERE location_id IN (");
        let mut separated = builder.separated(", ");
        for id in location_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY created_at ASC, rowid ASC");

        let rows: Vec<(Uuid, Uuid)> = builder.build_query_as().fetch_all(&*self.db).await?;
        for (location_id, booking_id) in rows {
            grouped.entry(location_id).or_default().push(booking_id);
        }
        Ok(grouped)
    }

    /// Flattened single location with `country`, `description` and its
    /// full booking records.
    pub async fn get(&self, id: Uuid) -> ServiceResult<LocationDetail> {
        let row = sqlx::query_as::<_, FlatLocationRow>(flat_location_select!("WHERE l.id = ?"))
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "location",
                id,
            })?;

        let booking = sqlx::query_as::<_, BookingRow>(
            "SELECT id, location_id, client_id, start_at, end_at, created_at
             FROM bookings WHERE location_id = ? ORDER BY created_at ASC, rowid ASC",
        )
        .bind(id)
        .fetch_all(&*self.db)
        .await?
        .into_iter()
        .map(Booking::from)
        .collect();

        let (summary, country, description) = split_row(row)?;
        Ok(LocationDetail {
            summary,
            country,
            description,
            booking,
        })
    }

    /// Price of a location, used by the booking form.
    pub async fn price(&self, id: Uuid) -> ServiceResult<LocationPrice> {
        let price: String = sqlx::query_scalar("SELECT price FROM locations WHERE id = ?")
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "location",
                id,
            })?;
        Ok(LocationPrice {
            id,
            price: parse_price(&price)?,
        })
    }

    /// Insert a validated location. Every reference is checked first and
    /// all missing ones are reported together.
    pub async fn create(&self, new: NewLocation) -> ServiceResult<LocationDetail> {
        let mut errors = ValidationError::new();
        for (kind, id) in new.refs.iter() {
            if !reference_exists(&*self.db, kind, id).await? {
                errors.add(
                    kind.field(),
                    "reference",
                    format!("{} `{}` does not exist", kind.label(), id),
                );
            }
        }
        errors.into_result()?;

        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO locations (
                id, country, area_id, region_id, city_id, street_id, direction_id,
                format_id, legal_entity_id, price, rent, reserve, lighting, placement,
                size, address_note, description, day_image, schema_image, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&new.country)
        .bind(new.refs.area)
        .bind(new.refs.region)
        .bind(new.refs.city)
        .bind(new.refs.street)
        .bind(new.refs.direction)
        .bind(new.refs.format)
        .bind(new.refs.legal_entity)
        .bind(new.price.to_string())
        .bind(Json(new.rent))
        .bind(new.reserve)
        .bind(new.lighting)
        .bind(new.placement)
        .bind(&new.size)
        .bind(&new.address_note)
        .bind(&new.description)
        .bind(&new.day_image)
        .bind(&new.schema_image)
        .bind(Utc::now())
        .execute(&*self.db)
        .await?;

        info!(%id, price = %new.price, "location created");
        self.get(id).await
    }

    /// Partial update.
    ///
    /// Each incoming reference that differs from the stored one must exist
    /// in its table, otherwise the whole update fails and nothing is
    /// written. Equal references are skipped without a lookup. Free-text
    /// fields are replaced only when they changed. All changes go out in a
    /// single `UPDATE`.
    pub async fn update(&self, id: Uuid, body: &UpdateLocation) -> ServiceResult<LocationDetail> {
        let stored = self.stored(id).await?;
        let current = stored.refs();

        let mut changed_refs: Vec<(LookupKind, Uuid)> = Vec::new();
        for (kind, current_id) in current.iter() {
            if let Some(new_id) =
                resolve_reference_change(&*self.db, kind, current_id, body.reference(kind)).await?
            {
                changed_refs.push((kind, new_id));
            }
        }

        let address_note = body
            .address_note()
            .filter(|v| *v != stored.address_note);
        let description = body.description().filter(|v| *v != stored.description);

        if changed_refs.is_empty() && address_note.is_none() && description.is_none() {
            debug!(%id, "location update changed nothing");
            return self.get(id).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE locations SET ");
        let mut assignments = builder.separated(", ");
        for (kind, new_id) in &changed_refs {
            if let Some(column) = kind.location_column() {
                assignments.push(format!("{column} = "));
                assignments.push_bind_unseparated(*new_id);
            }
        }
        if let Some(note) = address_note {
            assignments.push("address_note = ");
            assignments.push_bind_unseparated(note.to_string());
        }
        if let Some(text) = description {
            assignments.push("description = ");
            assignments.push_bind_unseparated(text.to_string());
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.build().execute(&*self.db).await?;

        info!(
            %id,
            references = ?changed_refs.iter().map(|(k, _)| k.field()).collect::<Vec<_>>(),
            address_note = address_note.is_some(),
            description = description.is_some(),
            "location updated"
        );
        self.get(id).await
    }

    /// Delete a location; its bookings go with it. Returns the removed row
    /// so the caller can clean up image files.
    pub async fn delete(&self, id: Uuid) -> ServiceResult<StoredLocation> {
        let stored = self.stored(id).await?;
        sqlx::query("DELETE FROM locations WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        info!(%id, "location deleted");
        Ok(stored)
    }

    async fn stored(&self, id: Uuid) -> ServiceResult<StoredLocation> {
        sqlx::query_as::<_, StoredLocation>(STORED_LOCATION_SELECT)
            .bind(id)
            .fetch_optional(&*self.db)
            .await?
            .ok_or(ServiceError::NotFound {
                entity: "location",
                id,
            })
    }
}

fn split_row(row: FlatLocationRow) -> ServiceResult<(LocationSummary, String, String)> {
    let id = row.id;
    row.into_parts()
        .map_err(|err| ServiceError::Corrupt(format!("price of location {id}: {err}")))
}

fn parse_price(raw: &str) -> ServiceResult<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|err| ServiceError::Corrupt(format!("price `{raw}`: {err}")))
}

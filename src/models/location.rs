//! A rentable placement unit and its payload shapes.
//!
//! Storage keeps references to the lookup tables; every outgoing shape is
//! flattened so references appear as the referenced record's name.

use super::{booking::Booking, lookup::LookupKind, validation::ValidationError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use std::collections::HashMap;
use uuid::Uuid;

/// Rent period of a location. Either end may be open.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Rent {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

/// Identifiers of the lookup records a location points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocationRefs {
    pub area: Uuid,
    pub region: Uuid,
    pub city: Uuid,
    pub street: Uuid,
    pub direction: Uuid,
    pub format: Uuid,
    pub legal_entity: Uuid,
}

impl LocationRefs {
    pub fn get(&self, kind: LookupKind) -> Option<Uuid> {
        match kind {
            LookupKind::Area => Some(self.area),
            LookupKind::Region => Some(self.region),
            LookupKind::City => Some(self.city),
            LookupKind::Street => Some(self.street),
            LookupKind::Direction => Some(self.direction),
            LookupKind::Format => Some(self.format),
            LookupKind::LegalEntity => Some(self.legal_entity),
            LookupKind::Lighting => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (LookupKind, Uuid)> + '_ {
        LookupKind::ALL
            .into_iter()
            .filter_map(move |kind| self.get(kind).map(|id| (kind, id)))
    }
}

/// A validated location ready to insert.
#[derive(Clone, Debug)]
pub struct NewLocation {
    pub country: String,
    pub refs: LocationRefs,
    pub price: Decimal,
    pub rent: Rent,
    pub reserve: bool,
    pub lighting: bool,
    pub placement: bool,
    pub size: String,
    pub address_note: String,
    pub description: String,
    pub day_image: String,
    pub schema_image: String,
}

/// Text fields and stored image names collected from a multipart create
/// request, before validation.
#[derive(Debug, Default)]
pub struct LocationForm {
    pub fields: HashMap<String, String>,
    pub day_image: Option<String>,
    pub schema_image: Option<String>,
}

impl LocationForm {
    fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn required_text(&self, name: &str, errors: &mut ValidationError) -> String {
        match self.text(name) {
            Some(v) => v.to_string(),
            None => {
                errors.add(name, "required", format!("{name} is required"));
                String::new()
            }
        }
    }

    fn reference(&self, kind: LookupKind, errors: &mut ValidationError) -> Uuid {
        let field = kind.field();
        match self.text(field) {
            None => {
                errors.add(field, "required", format!("{field} is required"));
                Uuid::nil()
            }
            Some(raw) => Uuid::parse_str(raw).unwrap_or_else(|_| {
                errors.add(
                    field,
                    "reference",
                    format!("`{raw}` is not a valid {} id", kind.label()),
                );
                Uuid::nil()
            }),
        }
    }

    fn json_flag(&self, name: &str, errors: &mut ValidationError) -> bool {
        match self.text(name) {
            None => false,
            Some(raw) => serde_json::from_str::<bool>(raw).unwrap_or_else(|_| {
                errors.add(name, "format", format!("{name} must be true or false"));
                false
            }),
        }
    }

    /// Check every field and report all failures at once.
    pub fn into_new(self) -> Result<NewLocation, ValidationError> {
        let mut errors = ValidationError::new();

        let country = self.required_text("country", &mut errors);
        let refs = LocationRefs {
            area: self.reference(LookupKind::Area, &mut errors),
            region: self.reference(LookupKind::Region, &mut errors),
            city: self.reference(LookupKind::City, &mut errors),
            street: self.reference(LookupKind::Street, &mut errors),
            direction: self.reference(LookupKind::Direction, &mut errors),
            format: self.reference(LookupKind::Format, &mut errors),
            legal_entity: self.reference(LookupKind::LegalEntity, &mut errors),
        };

        let price = match self.text("price") {
            None => {
                errors.add("price", "required", "price is required");
                Decimal::ZERO
            }
            Some(raw) => match Decimal::from_str_exact(raw) {
                Ok(p) if p.is_sign_negative() => {
                    errors.add("price", "min", "price must not be negative");
                    p
                }
                Ok(p) => p,
                Err(_) => {
                    errors.add("price", "format", format!("`{raw}` is not a decimal number"));
                    Decimal::ZERO
                }
            },
        };

        let rent = match self.text("rent") {
            None => Rent::default(),
            Some(raw) => serde_json::from_str::<Rent>(raw).unwrap_or_else(|_| {
                errors.add("rent", "format", "rent must be an object with start and end dates");
                Rent::default()
            }),
        };

        let reserve = match self.text("reserve") {
            None => false,
            Some("true" | "1" | "on") => true,
            Some("false" | "0" | "off") => false,
            Some(_) => {
                errors.add("reserve", "format", "reserve must be true or false");
                false
            }
        };

        let lighting = self.json_flag("lighting", &mut errors);
        let placement = self.json_flag("placement", &mut errors);
        let size = self.required_text("size", &mut errors);
        let address_note = self.text("addressNote").unwrap_or_default().to_string();
        let description = self.text("description").unwrap_or_default().to_string();

        if self.day_image.is_none() {
            errors.add("dayImage", "required", "dayImage file is required");
        }
        if self.schema_image.is_none() {
            errors.add("schemaImage", "required", "schemaImage file is required");
        }

        errors.into_result()?;

        Ok(NewLocation {
            country,
            refs,
            price,
            rent,
            reserve,
            lighting,
            placement,
            size,
            address_note,
            description,
            day_image: self.day_image.unwrap_or_default(),
            schema_image: self.schema_image.unwrap_or_default(),
        })
    }
}

/// Raw reference columns of one stored location, used by the edit path.
#[derive(FromRow, Debug, Clone)]
pub struct StoredLocation {
    pub id: Uuid,
    pub area_id: Uuid,
    pub region_id: Uuid,
    pub city_id: Uuid,
    pub street_id: Uuid,
    pub direction_id: Uuid,
    pub format_id: Uuid,
    pub legal_entity_id: Uuid,
    pub address_note: String,
    pub description: String,
    pub day_image: String,
    pub schema_image: String,
}

impl StoredLocation {
    pub fn refs(&self) -> LocationRefs {
        LocationRefs {
            area: self.area_id,
            region: self.region_id,
            city: self.city_id,
            street: self.street_id,
            direction: self.direction_id,
            format: self.format_id,
            legal_entity: self.legal_entity_id,
        }
    }
}

/// One row of the flattened select: references already joined to names.
#[derive(FromRow, Debug)]
pub struct FlatLocationRow {
    pub id: Uuid,
    pub country: String,
    pub description: String,
    pub price: String,
    pub rent: Json<Rent>,
    pub reserve: bool,
    pub lighting: bool,
    pub placement: bool,
    pub size: String,
    pub address_note: String,
    pub day_image: String,
    pub schema_image: String,
    pub created_at: DateTime<Utc>,
    pub area: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub direction: Option<String>,
    pub format: Option<String>,
    pub legal_entity: Option<String>,
}

/// Fields shared by the listing and the single-item view.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationSummary {
    pub id: Uuid,
    pub area: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub direction: Option<String>,
    pub format: Option<String>,
    pub legal_entity: Option<String>,
    pub price: Decimal,
    pub rent: Rent,
    pub reserve: bool,
    pub lighting: bool,
    pub placement: bool,
    pub size: String,
    pub address_note: String,
    pub day_image: String,
    pub schema_image: String,
    pub created_at: DateTime<Utc>,
}

/// Listing entry. `country` and `description` are left out on purpose;
/// only the single-item view carries them.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LocationListItem {
    #[serde(flatten)]
    pub summary: LocationSummary,
    pub booking: Vec<Uuid>,
}

/// `GET /locations/{id}` payload.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LocationDetail {
    #[serde(flatten)]
    pub summary: LocationSummary,
    pub country: String,
    pub description: String,
    pub booking: Vec<Booking>,
}

impl FlatLocationRow {
    /// Split into the shared summary plus `(country, description)`.
    ///
    /// Fails only if the stored price text is not a decimal, which the
    /// write path never produces.
    pub fn into_parts(self) -> Result<(LocationSummary, String, String), rust_decimal::Error> {
        let price = self.price.parse::<Decimal>()?;
        let summary = LocationSummary {
            id: self.id,
            area: self.area,
            region: self.region,
            city: self.city,
            street: self.street,
            direction: self.direction,
            format: self.format,
            legal_entity: self.legal_entity,
            price,
            rent: self.rent.0,
            reserve: self.reserve,
            lighting: self.lighting,
            placement: self.placement,
            size: self.size,
            address_note: self.address_note,
            day_image: self.day_image,
            schema_image: self.schema_image,
            created_at: self.created_at,
        };
        Ok((summary, self.country, self.description))
    }
}

/// Body of `PUT /locations/{id}`. Absent fields are left alone.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLocation {
    pub area: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub direction: Option<String>,
    pub format: Option<String>,
    pub legal_entity: Option<String>,
    pub address_note: Option<serde_json::Value>,
    pub description: Option<serde_json::Value>,
}

impl UpdateLocation {
    /// Non-empty incoming reference for `kind`, still unparsed.
    pub fn reference(&self, kind: LookupKind) -> Option<&str> {
        let raw = match kind {
            LookupKind::Area => self.area.as_deref(),
            LookupKind::Region => self.region.as_deref(),
            LookupKind::City => self.city.as_deref(),
            LookupKind::Street => self.street.as_deref(),
            LookupKind::Direction => self.direction.as_deref(),
            LookupKind::Format => self.format.as_deref(),
            LookupKind::LegalEntity => self.legal_entity.as_deref(),
            LookupKind::Lighting => None,
        };
        raw.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Only string values replace text fields; anything else is ignored.
    pub fn address_note(&self) -> Option<&str> {
        self.address_note.as_ref().and_then(|v| v.as_str())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_ref().and_then(|v| v.as_str())
    }
}

/// `GET /bookings/{location}` payload.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LocationPrice {
    pub id: Uuid,
    pub price: Decimal,
}

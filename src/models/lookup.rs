//! Small name-bearing reference tables (regions, cities, streets, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Every lookup table known to the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LookupKind {
    Region,
    City,
    Street,
    Area,
    Format,
    Direction,
    LegalEntity,
    Lighting,
}

impl LookupKind {
    pub const ALL: [LookupKind; 8] = [
        LookupKind::Region,
        LookupKind::City,
        LookupKind::Street,
        LookupKind::Area,
        LookupKind::Format,
        LookupKind::Direction,
        LookupKind::LegalEntity,
        LookupKind::Lighting,
    ];

    /// SQL table holding this kind.
    pub fn table(self) -> &'static str {
        match self {
            LookupKind::Region => "regions",
            LookupKind::City => "cities",
            LookupKind::Street => "streets",
            LookupKind::Area => "areas",
            LookupKind::Format => "formats",
            LookupKind::Direction => "directions",
            LookupKind::LegalEntity => "legal_entities",
            LookupKind::Lighting => "lightings",
        }
    }

    /// URL segment the kind is mounted under.
    pub fn route(self) -> &'static str {
        match self {
            LookupKind::Region => "/regions",
            LookupKind::City => "/cities",
            LookupKind::Street => "/streets",
            LookupKind::Area => "/areas",
            LookupKind::Format => "/formats",
            LookupKind::Direction => "/directions",
            LookupKind::LegalEntity => "/legal_entities",
            LookupKind::Lighting => "/lightings",
        }
    }

    /// Column in `locations` referencing this kind, if any.
    pub fn location_column(self) -> Option<&'static str> {
        match self {
            LookupKind::Region => Some("region_id"),
            LookupKind::City => Some("city_id"),
            LookupKind::Street => Some("street_id"),
            LookupKind::Area => Some("area_id"),
            LookupKind::Format => Some("format_id"),
            LookupKind::Direction => Some("direction_id"),
            LookupKind::LegalEntity => Some("legal_entity_id"),
            LookupKind::Lighting => None,
        }
    }

    /// Field name used in request and response bodies.
    pub fn field(self) -> &'static str {
        match self {
            LookupKind::Region => "region",
            LookupKind::City => "city",
            LookupKind::Street => "street",
            LookupKind::Area => "area",
            LookupKind::Format => "format",
            LookupKind::Direction => "direction",
            LookupKind::LegalEntity => "legalEntity",
            LookupKind::Lighting => "lighting",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LookupKind::Region => "region",
            LookupKind::City => "city",
            LookupKind::Street => "street",
            LookupKind::Area => "area",
            LookupKind::Format => "format",
            LookupKind::Direction => "direction",
            LookupKind::LegalEntity => "legal entity",
            LookupKind::Lighting => "lighting",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LookupEntry {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /<kind>`.
#[derive(Deserialize, Validate, Debug)]
pub struct CreateLookup {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub name: String,
}

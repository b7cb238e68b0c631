use crate::{
    config::AppConfig,
    services::{
        booking_service::BookingService, location_service::LocationService,
        lookup_service::LookupService, upload_store::UploadStore, user_service::UserService,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared state handed to every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub locations: LocationService,
    pub bookings: BookingService,
    pub lookups: LookupService,
    pub users: UserService,
    pub uploads: UploadStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, config: AppConfig) -> Self {
        Self {
            locations: LocationService::new(db.clone()),
            bookings: BookingService::new(db.clone()),
            lookups: LookupService::new(db.clone()),
            users: UserService::new(db.clone()),
            uploads: UploadStore::new(&config.upload_dir),
            config: Arc::new(config),
            db,
        }
    }
}

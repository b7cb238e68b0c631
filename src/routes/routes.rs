//! Route table.
//!
//! ## Structure
//! - **Locations**
//!   - `GET    /locations`: paginated, reference-flattened listing
//!   - `POST   /locations`: multipart create with images (auth)
//!   - `GET    /locations/{id}`: single location with bookings
//!   - `PUT    /locations/{id}`: reference-validated partial update (auth)
//!   - `DELETE /locations/{id}`: delete with its bookings (auth)
//!
//! - **Bookings**
//!   - `POST   /bookings`: create (auth)
//!   - `GET    /bookings/{locationId}`: price of a location
//!   - `DELETE /bookings/{locationId}/{bookingId}`: delete (auth)
//!
//! - **Lookups**: `/regions`, `/cities`, `/streets`, `/areas`, `/formats`,
//!   `/directions`, `/legal_entities`, `/lightings`, each with `GET`,
//!   `POST` (auth) and `DELETE /{id}` (auth).
//!
//! - **Users**: `POST /users`, `POST|DELETE /users/sessions`, and the
//!   admin-only `GET /users`, `GET|PUT|DELETE /users/{id}`.
//!
//! - `GET /images/{file}` serves stored uploads.

use crate::{
    handlers::{
        booking_handlers::{create_booking, delete_booking, location_price},
        health_handlers::{healthz, readyz},
        location_handlers::{
            create_location, delete_location, get_location, list_locations, update_location,
        },
        lookup_handlers::{create_entry, delete_entry, list_entries},
        user_handlers::{
            delete_user, get_user, list_users, login, logout, register, update_user,
        },
    },
    models::lookup::LookupKind,
    state::AppState,
};
use axum::{
    Extension, Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

/// Multipart location uploads carry two images.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// All API routes, still waiting for their state.
pub fn routes() -> Router<AppState> {
    let mut router = Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/locations", get(list_locations).post(create_location))
        .route(
            "/locations/{id}",
            get(get_location)
                .put(update_location)
                .delete(delete_location),
        )
        .route("/bookings", post(create_booking))
        .route("/bookings/{location_id}", get(location_price))
        .route("/bookings/{location_id}/{booking_id}", delete(delete_booking))
        .route("/users", post(register).get(list_users))
        .route("/users/sessions", post(login).delete(logout))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        );

    for kind in LookupKind::ALL {
        router = router.nest(kind.route(), lookup_routes(kind));
    }
    router
}

fn lookup_routes(kind: LookupKind) -> Router<AppState> {
    Router::new()
        .route("/", get(list_entries).post(create_entry))
        .route("/{id}", delete(delete_entry))
        .layer(Extension(kind))
}

/// The complete application: routes, static images and middleware.
pub fn app(state: AppState) -> Router {
    let images = ServeDir::new(state.uploads.images_dir());
    let cors = cors_layer(&state.config.cors_origins);

    routes()
        .nest_service("/images", images)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Allow the configured origins, or any origin when none are configured.
/// Origins that are not valid header values are skipped with a warning.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(parsed)
}

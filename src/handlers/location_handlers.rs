//! HTTP handlers for locations.
//! Image uploads are streamed to the upload store before the row is
//! validated, and removed again if the location is not created.

use crate::{
    errors::{AppError, AppResult},
    extract::{JsonBody, PathParams, QueryParams},
    middleware::auth::AuthUser,
    models::{
        location::{LocationDetail, LocationForm, LocationListItem, UpdateLocation},
        pagination::{Page, PageQuery},
        validation::ValidationError,
    },
    services::upload_store::UploadStore,
    state::AppState,
};
use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use futures::TryStreamExt;
use serde_json::json;
use std::io;
use tracing::{debug, info};
use uuid::Uuid;

const DAY_IMAGE: &str = "dayImage";
const SCHEMA_IMAGE: &str = "schemaImage";

/// `GET /locations?page=&perPage=`
pub async fn list_locations(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Json<Page<LocationListItem>>> {
    let page = state
        .locations
        .list(query.page(), query.per_page())
        .await?;
    Ok(Json(page))
}

/// `GET /locations/{id}`
pub async fn get_location(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> AppResult<Json<LocationDetail>> {
    Ok(Json(state.locations.get(id).await?))
}

/// `POST /locations` (multipart/form-data)
pub async fn create_location(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut stored: Vec<String> = Vec::new();
    let result = create_from_multipart(&state, multipart, &mut stored).await;

    match result {
        Ok(location) => {
            info!(id = %location.summary.id, by = %auth.user.id, "location created via api");
            Ok(Json(json!({
                "message": "Location created",
                "location": location,
            })))
        }
        Err(err) => {
            discard_images(&state.uploads, &stored).await;
            Err(err)
        }
    }
}

async fn create_from_multipart(
    state: &AppState,
    mut multipart: Multipart,
    stored: &mut Vec<String>,
) -> AppResult<LocationDetail> {
    let mut form = LocationForm::default();
    let mut upload_errors = ValidationError::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == DAY_IMAGE || name == SCHEMA_IMAGE {
            let taken = if name == DAY_IMAGE {
                form.day_image.is_some()
            } else {
                form.schema_image.is_some()
            };
            // A second part would leave the first file unreferenced.
            if taken || upload_errors.has(&name) {
                upload_errors.add(&name, "format", format!("{name} must be sent once"));
                continue;
            }
            let is_image = field
                .content_type()
                .is_some_and(|ct| ct.starts_with("image/"));
            if !is_image {
                upload_errors.add(&name, "format", format!("{name} must be an image"));
                continue;
            }
            let original = field.file_name().map(str::to_string);
            let stream = field.map_err(io::Error::other);
            let file = state
                .uploads
                .store_image(original.as_deref(), stream)
                .await
                .map_err(|e| AppError::bad_request(format!("could not store {name}: {e}")))?;
            stored.push(file.filename.clone());
            if name == DAY_IMAGE {
                form.day_image = Some(file.filename);
            } else {
                form.schema_image = Some(file.filename);
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            form.fields.insert(name, value);
        }
    }

    // Upload problems are recorded first so they win over "required".
    let mut errors = upload_errors;
    match form.into_new() {
        Ok(new) if errors.is_empty() => Ok(state.locations.create(new).await?),
        Ok(_) => Err(errors.into()),
        Err(form_errors) => {
            for (field, err) in form_errors.errors {
                errors.add(&field, &err.kind, err.message);
            }
            Err(errors.into())
        }
    }
}

async fn discard_images(uploads: &UploadStore, stored: &[String]) {
    for filename in stored {
        uploads.remove_image(filename).await;
    }
    if !stored.is_empty() {
        debug!(count = stored.len(), "discarded location images");
    }
}

/// `PUT /locations/{id}`
///
/// A missing location is reported as 400 rather than 404.
pub async fn update_location(
    State(state): State<AppState>,
    _auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
    JsonBody(body): JsonBody<UpdateLocation>,
) -> AppResult<Json<LocationDetail>> {
    let location = state
        .locations
        .update(id, &body)
        .await
        .map_err(|e| AppError::from(e).not_found_as_bad_request())?;
    Ok(Json(location))
}

/// `DELETE /locations/{id}`
pub async fn delete_location(
    State(state): State<AppState>,
    auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> AppResult<impl IntoResponse> {
    let removed = state.locations.delete(id).await?;
    discard_images(
        &state.uploads,
        &[removed.day_image.clone(), removed.schema_image.clone()],
    )
    .await;
    info!(%id, by = %auth.user.id, "location deleted via api");
    Ok(Json(json!({ "deleted": id })))
}

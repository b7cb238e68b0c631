//! One set of handlers serves every lookup table. The router nests them
//! once per kind and passes the kind in as an extension.

use crate::{
    errors::AppResult,
    extract::{PathParams, ValidatedJson},
    middleware::auth::AuthUser,
    models::lookup::{CreateLookup, LookupEntry, LookupKind},
    state::AppState,
};
use axum::{
    Extension, Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

pub async fn list_entries(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
) -> AppResult<Json<Vec<LookupEntry>>> {
    Ok(Json(state.lookups.list(kind).await?))
}

pub async fn create_entry(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    _auth: AuthUser,
    ValidatedJson(body): ValidatedJson<CreateLookup>,
) -> AppResult<Json<LookupEntry>> {
    Ok(Json(state.lookups.create(kind, &body.name).await?))
}

pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(kind): Extension<LookupKind>,
    _auth: AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.lookups.delete(kind, id).await?;
    Ok(Json(json!({ "deleted": id })))
}

//! Registration, sessions and admin-only user management.

use crate::{
    errors::AppResult,
    extract::{JsonBody, PathParams, QueryParams, ValidatedJson},
    middleware::auth::{AuthUser, RequireAdmin},
    models::{
        pagination::{Page, PageQuery},
        user::{Login, RegisterUser, Session, UpdateUser, User},
    },
    state::AppState,
};
use axum::{
    Json,
    extract::State,
    response::IntoResponse,
};
use serde_json::json;
use uuid::Uuid;

/// `POST /users`
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterUser>,
) -> AppResult<Json<Session>> {
    Ok(Json(state.users.register(body).await?))
}

/// `POST /users/sessions`
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Login>,
) -> AppResult<Json<Session>> {
    Ok(Json(state.users.login(&body).await?))
}

/// `DELETE /users/sessions`
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<impl IntoResponse> {
    state.users.logout(auth.user.id).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

/// `GET /users?page=&perPage=`
pub async fn list_users(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    QueryParams(query): QueryParams<PageQuery>,
) -> AppResult<Json<Page<User>>> {
    Ok(Json(state.users.list(query.page(), query.per_page()).await?))
}

pub async fn get_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    PathParams(id): PathParams<Uuid>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.get(id).await?))
}

pub async fn update_user(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    PathParams(id): PathParams<Uuid>,
    ValidatedJson(body): ValidatedJson<UpdateUser>,
) -> AppResult<Json<User>> {
    Ok(Json(state.users.update(id, body).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    PathParams(id): PathParams<Uuid>,
) -> AppResult<impl IntoResponse> {
    state.users.delete(admin.user.id, id).await?;
    Ok(Json(json!({ "deleted": id })))
}

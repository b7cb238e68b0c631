//! Session-token extractors.
//!
//! `AuthUser` accepts `Authorization: Bearer <token>` or the bare token and
//! rejects with 401. `RequireAdmin` additionally rejects non-admins with 403.

use crate::{
    auth::token_from_header,
    errors::AppError,
    models::user::{ROLE_ADMIN, User},
    state::AppState,
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(token_from_header)
            .ok_or_else(|| AppError::unauthorized("missing Authorization header"))?
            .to_string();

        let user = state.users.authenticate(&token).await?;
        Ok(AuthUser { user, token })
    }
}

pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        if auth.user.role != ROLE_ADMIN {
            return Err(AppError::forbidden("admin role required"));
        }
        Ok(RequireAdmin(auth))
    }
}

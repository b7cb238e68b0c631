//! Health & readiness handlers.
//!
//! - GET /healthz  -> liveness, no I/O
//! - GET /readyz   -> checks the database and the upload directory

use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::{collections::BTreeMap, path::Path};
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `GET /readyz`
///
/// 200 when the database answers `SELECT 1` and a probe file can be
/// written, read back and removed in the upload directory; 503 otherwise.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let mut checks = BTreeMap::new();
    checks.insert("sqlite", database_check(&state).await);
    checks.insert("uploads", disk_check(&state.uploads.base_path).await);

    let ready = checks.values().all(|c| c.ok);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = ReadyResponse {
        status: if ready { "ok" } else { "error" },
        checks,
    };
    (status, Json(body))
}

async fn database_check(state: &AppState) -> CheckStatus {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*state.db)
        .await
    {
        Ok(1) => CheckStatus::passed(),
        Ok(v) => CheckStatus::failed(format!("unexpected result: {v}")),
        Err(e) => CheckStatus::failed(format!("error: {e}")),
    }
}

async fn disk_check(dir: &Path) -> CheckStatus {
    if let Err(e) = fs::create_dir_all(dir).await {
        return CheckStatus::failed(format!("could not create upload dir: {e}"));
    }
    let probe = dir.join(format!(".readyz-{}", Uuid::new_v4()));
    if let Err(e) = fs::write(&probe, b"readyz").await {
        return CheckStatus::failed(format!("could not write probe file: {e}"));
    }
    let result = match fs::read(&probe).await {
        Ok(bytes) if bytes == b"readyz" => CheckStatus::passed(),
        Ok(_) => CheckStatus::failed("probe file content mismatch".into()),
        Err(e) => CheckStatus::failed(format!("could not read probe file: {e}")),
    };
    if let Err(e) = fs::remove_file(&probe).await {
        tracing::warn!(error = %e, "could not remove readiness probe file");
    }
    result
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    checks: BTreeMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl CheckStatus {
    fn passed() -> Self {
        Self { ok: true, error: None }
    }

    fn failed(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
        }
    }
}

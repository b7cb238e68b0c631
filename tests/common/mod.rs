//! Shared helpers for the HTTP integration tests.
//!
//! Every test gets its own in-memory database and upload directory and
//! drives the full router (middleware included) with `oneshot`.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use location_admin::{
    config::AppConfig,
    db,
    models::{
        location::{LocationRefs, NewLocation, Rent},
        lookup::LookupKind,
    },
    routes,
    state::AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@example.kg";
pub const ADMIN_PASSWORD: &str = "admin-pass";
pub const BOUNDARY: &str = "----location-admin-test";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub uploads: TempDir,
}

pub async fn build_test_app() -> TestApp {
    let uploads = tempfile::tempdir().expect("temp dir");
    let pool = db::connect_in_memory().await.expect("in-memory pool");
    db::run_migrations(&pool).await.expect("migrations");

    let config = AppConfig {
        upload_dir: uploads.path().to_string_lossy().into_owned(),
        database_url: "sqlite::memory:".into(),
        cors_origins: vec!["http://localhost:3000".into()],
        ..AppConfig::default()
    };
    let state = AppState::new(Arc::new(pool), config);
    let router = routes::app(state.clone());

    TestApp {
        router,
        state,
        uploads,
    }
}

impl TestApp {
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Seed the admin account and log it in through the API.
    pub async fn admin_token(&self) -> String {
        self.state
            .users
            .ensure_admin(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("seed admin");
        let res = post_json(
            self.app(),
            "/users/sessions",
            None,
            serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        )
        .await;
        body_json(res).await["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    /// Register a plain user through the API and return its token.
    pub async fn user_token(&self, email: &str) -> String {
        let res = post_json(
            self.app(),
            "/users",
            None,
            serde_json::json!({
                "email": email,
                "password": "user-pass",
                "displayName": "Operator",
            }),
        )
        .await;
        body_json(res).await["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }

    /// One entry per lookup kind, named after the kind.
    pub async fn seed_refs(&self) -> LocationRefs {
        let mut ids = Vec::new();
        for kind in LookupKind::ALL {
            let entry = self
                .state
                .lookups
                .create(kind, &format!("{} one", kind.label()))
                .await
                .expect("create lookup");
            ids.push((kind, entry.id));
        }
        let id = |k: LookupKind| {
            ids.iter()
                .find(|(kind, _)| *kind == k)
                .map(|(_, id)| *id)
                .expect("seeded kind")
        };
        LocationRefs {
            region: id(LookupKind::Region),
            city: id(LookupKind::City),
            street: id(LookupKind::Street),
            area: id(LookupKind::Area),
            format: id(LookupKind::Format),
            direction: id(LookupKind::Direction),
            legal_entity: id(LookupKind::LegalEntity),
        }
    }

    /// Insert a location directly through the service.
    pub async fn seed_location(&self, refs: LocationRefs, size: &str) -> Uuid {
        self.state
            .locations
            .create(NewLocation {
                country: "Kyrgyzstan".into(),
                refs,
                price: "1500.50".parse().expect("decimal"),
                rent: Rent::default(),
                reserve: false,
                lighting: true,
                placement: false,
                size: size.into(),
                address_note: "near the bazaar".into(),
                description: "billboard".into(),
                day_image: "day.jpg".into(),
                schema_image: "schema.jpg".into(),
            })
            .await
            .expect("create location")
            .summary
            .id
    }
}

fn with_auth(builder: axum::http::request::Builder, token: Option<&str>) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let req = with_auth(Request::get(uri), token)
        .body(Body::empty())
        .expect("request");
    app.oneshot(req).await.expect("response")
}

pub async fn delete(app: Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let req = with_auth(Request::delete(uri), token)
        .body(Body::empty())
        .expect("request");
    app.oneshot(req).await.expect("response")
}

pub async fn post_json(app: Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send_json(app, Request::post(uri), token, body).await
}

pub async fn put_json(app: Router, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
    send_json(app, Request::put(uri), token, body).await
}

async fn send_json(
    app: Router,
    builder: axum::http::request::Builder,
    token: Option<&str>,
    body: Value,
) -> Response<Body> {
    let req = with_auth(builder, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request");
    app.oneshot(req).await.expect("response")
}

pub async fn post_multipart(app: Router, uri: &str, token: Option<&str>, body: Vec<u8>) -> Response<Body> {
    let req = with_auth(Request::post(uri), token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request");
    app.oneshot(req).await.expect("response")
}

pub async fn body_bytes(res: Response<Body>) -> Vec<u8> {
    res.into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}

pub async fn body_json(res: Response<Body>) -> Value {
    let bytes = body_bytes(res).await;
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// A file part of a multipart body.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub data: &'a [u8],
}

/// Build a `multipart/form-data` body delimited by [`BOUNDARY`].
pub fn multipart_body(fields: &[(&str, String)], files: &[FilePart<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.file_name, file.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Text fields of a complete, valid create request for `refs`.
pub fn location_fields(refs: &LocationRefs) -> Vec<(&'static str, String)> {
    vec![
        ("country", "Kyrgyzstan".into()),
        ("region", refs.region.to_string()),
        ("city", refs.city.to_string()),
        ("street", refs.street.to_string()),
        ("area", refs.area.to_string()),
        ("format", refs.format.to_string()),
        ("direction", refs.direction.to_string()),
        ("legalEntity", refs.legal_entity.to_string()),
        ("price", "2500.75".into()),
        (
            "rent",
            r#"{"start":"2024-05-01T00:00:00Z","end":"2024-06-01T00:00:00Z"}"#.into(),
        ),
        ("reserve", "false".into()),
        ("lighting", "true".into()),
        ("placement", "false".into()),
        ("size", "3x6".into()),
        ("addressNote", "corner of Chui and Manas".into()),
        ("description", "double-sided".into()),
    ]
}

pub fn image_parts<'a>() -> Vec<FilePart<'a>> {
    vec![
        FilePart {
            field: "dayImage",
            file_name: "day.jpg",
            content_type: "image/jpeg",
            data: b"day-bytes",
        },
        FilePart {
            field: "schemaImage",
            file_name: "schema.png",
            content_type: "image/png",
            data: b"schema-bytes",
        },
    ]
}

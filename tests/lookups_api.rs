//! HTTP-level tests for the lookup tables.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, delete, get, post_json};
use location_admin::models::lookup::LookupKind;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn every_kind_is_mounted() {
    let app = build_test_app().await;
    let token = app.user_token("ops@example.kg").await;

    for kind in LookupKind::ALL {
        let res = post_json(app.app(), kind.route(), Some(&token), json!({ "name": "First" })).await;
        assert_eq!(res.status(), StatusCode::OK, "{}", kind.route());

        let res = get(app.app(), kind.route(), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = body_json(res).await;
        assert_eq!(body.as_array().unwrap().len(), 1, "{}", kind.route());
        assert_eq!(body[0]["name"], "First");
    }
}

#[tokio::test]
async fn entries_are_listed_by_name() {
    let app = build_test_app().await;
    let token = app.user_token("ops@example.kg").await;
    for name in ["Talas", "Batken", "Naryn"] {
        post_json(app.app(), "/regions", Some(&token), json!({ "name": name })).await;
    }

    let body = body_json(get(app.app(), "/regions", None).await).await;
    let names: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Batken", "Naryn", "Talas"]);
}

#[tokio::test]
async fn blank_and_duplicate_names_are_rejected() {
    let app = build_test_app().await;
    let token = app.user_token("ops@example.kg").await;

    let res = post_json(app.app(), "/cities", Some(&token), json!({ "name": "" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["name"], "ValidationError");

    post_json(app.app(), "/cities", Some(&token), json!({ "name": "Osh" })).await;
    let res = post_json(app.app(), "/cities", Some(&token), json!({ "name": "Osh" })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["errors"]["name"]["kind"], "unique");
}

#[tokio::test]
async fn writes_require_a_session() {
    let app = build_test_app().await;
    let res = post_json(app.app(), "/formats", None, json!({ "name": "3x6" })).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = delete(app.app(), &format!("/formats/{}", Uuid::new_v4()), None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_unused_entry() {
    let app = build_test_app().await;
    let token = app.user_token("ops@example.kg").await;
    let created = body_json(
        post_json(app.app(), "/streets", Some(&token), json!({ "name": "Manas" })).await,
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let res = delete(app.app(), &format!("/streets/{id}"), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["deleted"], id);

    let res = delete(app.app(), &format!("/streets/{id}"), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn referenced_entry_cannot_be_deleted() {
    let app = build_test_app().await;
    let token = app.user_token("ops@example.kg").await;
    let refs = app.seed_refs().await;
    app.seed_location(refs, "3x6").await;

    let res = delete(app.app(), &format!("/regions/{}", refs.region), Some(&token)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(res).await["error"].is_string());

    let body = body_json(get(app.app(), "/regions", None).await).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

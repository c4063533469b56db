//! Test utilities for integration tests
#![allow(dead_code)]

use std::sync::{Arc, RwLock};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tower::util::ServiceExt;

use salon::api::AppState;
use salon::api::app;
use salon::core::AppConfig;
use salon::core::db::{async_db, initialize_db};

/// Friday. Every test runs as if it were 08:00 on this day.
pub const TODAY: &str = "2026-10-16";
/// The next work day after `TODAY`
pub const MONDAY: &str = "2026-10-19";
pub const SUNDAY: &str = "2026-10-18";
pub const LAST_MONDAY: &str = "2026-10-12";

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 16)
        .unwrap()
        .and_time(NaiveTime::from_hms_opt(8, 0, 0).unwrap())
}

/// Creates a test application router backed by a fresh db in a
/// temporary directory.
pub async fn test_app() -> Router {
    let dir = tempfile::tempdir()
        .expect("Failed to create temp directory")
        .keep();
    let db_path = dir.join("db");
    let db_path = db_path.to_str().unwrap();

    let db = async_db(db_path)
        .await
        .expect("Failed to connect to async db");
    db.call(|conn| {
        initialize_db(conn).expect("Failed to migrate db");
        Ok(())
    })
    .await
    .unwrap();

    let app_config = AppConfig {
        storage_path: dir.display().to_string(),
        db_path: db_path.to_string(),
        default_access_days: 30,
    };
    let app_state = AppState::new(db, app_config).with_clock(fixed_now);
    app(Arc::new(RwLock::new(app_state)))
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

pub async fn body_to_json(body: Body) -> Value {
    serde_json::from_str(&body_to_string(body).await).expect("Body is not json")
}

pub fn admin() -> Vec<(&'static str, String)> {
    vec![
        ("x-user-id", "admin-1".to_string()),
        ("x-user-role", "admin".to_string()),
    ]
}

pub fn merchant(merchant_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("x-user-id", "owner-1".to_string()),
        ("x-user-role", "merchant".to_string()),
        ("x-merchant-id", merchant_id.to_string()),
    ]
}

pub fn client(user_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("x-user-id", user_id.to_string()),
        ("x-user-role", "client".to_string()),
    ]
}

pub fn request(
    method: &str,
    uri: &str,
    headers: &[(&'static str, String)],
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().uri(uri).method(method);
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Monday to Friday, 09:00 to 18:00
pub fn weekday_schedule() -> Value {
    serde_json::json!({
        "work_days": [1, 2, 3, 4, 5],
        "start_time": "09:00",
        "end_time": "18:00",
    })
}

pub async fn create_merchant(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/merchants",
            &admin(),
            Some(serde_json::json!({
                "name": "Test Salon",
                "schedule": weekday_schedule(),
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_json(response.into_body()).await;
    body["id"].as_str().unwrap().to_string()
}

pub async fn create_service(app: &Router, merchant_id: &str, duration_minutes: u32) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/merchants/{}/services", merchant_id),
            &merchant(merchant_id),
            Some(serde_json::json!({
                "name": "Haircut",
                "duration_minutes": duration_minutes,
                "price_cents": 3000,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_json(response.into_body()).await;
    body["id"].as_str().unwrap().to_string()
}

pub async fn create_employee(app: &Router, merchant_id: &str, schedule: Option<Value>) -> String {
    let response = app
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/merchants/{}/employees", merchant_id),
            &merchant(merchant_id),
            Some(serde_json::json!({
                "name": "Jo",
                "schedule": schedule,
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_json(response.into_body()).await;
    body["id"].as_str().unwrap().to_string()
}

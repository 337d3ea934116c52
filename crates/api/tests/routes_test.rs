use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use carebook_api::router;
use carebook_core::time::ManualClock;
use carebook_db::{MemoryGateway, mock::MockGateway};
use carebook_engine::{BookingEngine, BookingPolicy};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

struct TestApp {
    server: TestServer,
    clock: Arc<ManualClock>,
}

fn test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(now()));
    let engine = BookingEngine::new(
        Arc::new(MemoryGateway::new()),
        clock.clone(),
        BookingPolicy::default(),
    );
    TestApp {
        server: TestServer::new(router(engine)).unwrap(),
        clock,
    }
}

/// Creates provider `p1` with one hour of availability on 2026-03-05 and
/// returns the ids of its available slots.
async fn seeded(app: &TestApp) -> Vec<String> {
    app.server
        .post("/api/providers")
        .json(&json!({"id": "p1", "name": "Dr. One"}))
        .await
        .assert_status(StatusCode::CREATED);
    app.server
        .put("/api/providers/p1/availability")
        .json(&json!({"windows": [{"start": "2026-03-05T09:00:00Z", "end": "2026-03-05T10:00:00Z"}]}))
        .await
        .assert_status_ok();

    let slots: Value = app
        .server
        .get("/api/providers/p1/slots")
        .add_query_param("date", "2026-03-05")
        .await
        .json();
    slots["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|slot| slot["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn health_and_version() {
    let app = test_app();

    let health = app.server.get("/health").await;
    health.assert_status_ok();
    assert_eq!(health.json::<Value>(), json!({"status": "ok"}));

    let version = app.server.get("/version").await.json::<Value>();
    assert_eq!(version["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn provider_lifecycle() {
    let app = test_app();

    let created = app
        .server
        .post("/api/providers")
        .json(&json!({"id": "p1", "name": "Dr. One"}))
        .await;
    created.assert_status(StatusCode::CREATED);
    assert_eq!(created.json::<Value>()["name"], "Dr. One");

    app.server
        .post("/api/providers")
        .json(&json!({"id": "p1", "name": "Dr. Again"}))
        .await
        .assert_status(StatusCode::CONFLICT);

    let renamed = app
        .server
        .put("/api/providers/p1")
        .json(&json!({"name": "Dr. Renamed"}))
        .await;
    renamed.assert_status_ok();

    let fetched = app.server.get("/api/providers/p1").await.json::<Value>();
    assert_eq!(fetched["name"], "Dr. Renamed");

    app.server
        .get("/api/providers/ghost")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn publishing_availability_exposes_slots() {
    let app = test_app();
    let slot_ids = seeded(&app).await;
    assert_eq!(slot_ids.len(), 4);

    let slots: Value = app
        .server
        .get("/api/providers/p1/slots")
        .add_query_param("date", "2026-03-05")
        .await
        .json();
    let first = &slots["slots"][0];
    assert_eq!(first["start_time"], "2026-03-05T09:00:00Z");
    assert_eq!(first["end_time"], "2026-03-05T09:15:00Z");
    assert_eq!(first["status"], "available");
}

#[tokio::test]
async fn legacy_time_slots_field_is_accepted() {
    let app = test_app();
    app.server
        .post("/api/providers")
        .json(&json!({"id": "p1", "name": "Dr. One"}))
        .await;

    let response = app
        .server
        .put("/api/providers/p1/availability")
        .json(&json!({"time_slots": [{"start": "2026-03-05T09:00:00Z", "end": "2026-03-05T09:30:00Z"}]}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["slots_created"], 2);
}

#[tokio::test]
async fn malformed_input_is_a_bad_request() {
    let app = test_app();
    seeded(&app).await;

    let bad_window = app
        .server
        .put("/api/providers/p1/availability")
        .json(&json!({"windows": [{"start": "09:00", "end": "10:00"}]}))
        .await;
    bad_window.assert_status(StatusCode::BAD_REQUEST);
    assert!(bad_window.json::<Value>()["error"].as_str().unwrap().contains("invalid time format"));

    app.server
        .get("/api/providers/p1/slots")
        .add_query_param("date", "05/03/2026")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .get("/api/providers/p1/slots")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/slots/not-a-uuid/reserve")
        .json(&json!({"client_id": "c1"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reserve_and_confirm_flow() {
    let app = test_app();
    let slot_ids = seeded(&app).await;

    let reserved = app
        .server
        .post(&format!("/api/slots/{}/reserve", slot_ids[0]))
        .json(&json!({"client_id": "c1"}))
        .await;
    reserved.assert_status(StatusCode::CREATED);
    let reserved = reserved.json::<Value>();
    assert_eq!(reserved["expires_at"], "2026-03-02T08:30:00Z");
    let reservation_id = reserved["reservation_id"].as_str().unwrap().to_string();

    app.server
        .post(&format!("/api/slots/{}/reserve", slot_ids[0]))
        .json(&json!({"client_id": "c2"}))
        .await
        .assert_status(StatusCode::CONFLICT);

    app.server
        .post(&format!("/api/reservations/{reservation_id}/confirm"))
        .await
        .assert_status_ok();
    app.server
        .post(&format!("/api/reservations/{reservation_id}/confirm"))
        .await
        .assert_status(StatusCode::CONFLICT);

    let listing: Value = app.server.get("/api/clients/c1/reservations").await.json();
    let reservations = listing["reservations"].as_array().unwrap();
    assert_eq!(reservations.len(), 1);
    assert_eq!(reservations[0]["status"], "confirmed");
    assert_eq!(reservations[0]["start_time"], "2026-03-05T09:00:00Z");

    let by_provider: Value = app
        .server
        .get("/api/providers/p1/reservations")
        .add_query_param("date", "2026-03-05")
        .await
        .json();
    assert_eq!(by_provider["reservations"].as_array().unwrap().len(), 1);

    let other_day: Value = app
        .server
        .get("/api/providers/p1/reservations")
        .add_query_param("date", "2026-03-06")
        .await
        .json();
    assert_eq!(other_day["reservations"], json!([]));
}

#[tokio::test]
async fn lead_time_violation_is_unprocessable() {
    let app = test_app();
    let slot_ids = seeded(&app).await;

    app.clock.advance(Duration::days(2) + Duration::hours(12));
    let response = app
        .server
        .post(&format!("/api/slots/{}/reserve", slot_ids[0]))
        .json(&json!({"client_id": "c1"}))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_reservation_is_not_found() {
    let app = test_app();
    app.server
        .post("/api/reservations/7f0e8e4c-3d0a-4c1e-9a43-0c6f6f3b1a2d/confirm")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn datastore_failures_are_opaque() {
    let mut gateway = MockGateway::new();
    gateway
        .expect_begin()
        .returning(|| Err(eyre::eyre!("password authentication failed for user carebook")));
    let engine = BookingEngine::new(
        Arc::new(gateway),
        Arc::new(ManualClock::new(now())),
        BookingPolicy::default(),
    );
    let server = TestServer::new(router(engine)).unwrap();

    let response = server.get("/api/providers/p1").await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>(), json!({"error": "Internal server error"}));
}

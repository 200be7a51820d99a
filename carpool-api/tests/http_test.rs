use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderValue, Method, Request, StatusCode},
    Router,
};
use carpool_api::{app, AppState};
use carpool_core::{PasswordCost, PasswordHasher};
use carpool_store::Store;
use serde_json::{json, Value};
use tower::ServiceExt;

const ORIGIN: &str = "http://localhost:3000";

fn test_app() -> Router {
    let store = Store::memory();
    let hasher = PasswordHasher::new(PasswordCost::minimal()).unwrap();
    app(AppState::new(store.repositories, hasher), HeaderValue::from_static(ORIGIN))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

async fn post_ride(app: &Router, seats: Value) {
    let (_, body) = post(
        app,
        "/post-ride",
        json!({
            "studentId": "R1",
            "riderName": "Rita",
            "phoneNo": "555-0101",
            "source": "Library",
            "destination": "Central Station",
            "leaveDate": "2024-10-01",
            "leaveTime": "17:30",
            "seatsAvailable": seats,
            "note": ""
        }),
    )
    .await;
    assert_eq!(body, json!({ "success": true }));
}

async fn only_ride_id(app: &Router) -> String {
    let (_, body) = get(app, "/search-rides?destination=station&date=2024-10-01").await;
    body["rides"][0]["rideId"].as_str().unwrap().to_string()
}

async fn book(app: &Router, ride_id: &str, seater: &str) {
    let (_, body) = post(
        app,
        "/confirm-booking",
        json!({
            "rideId": ride_id,
            "seaterName": format!("Seater {}", seater),
            "seaterPhone": "555-0199",
            "seaterStudentId": seater
        }),
    )
    .await;
    assert_eq!(body, json!({ "success": true }));
}

#[tokio::test]
async fn register_and_login() {
    let app = test_app();
    let account = json!({
        "studentId": "S1",
        "fullName": "Sam Student",
        "phoneNumber": "555-0100",
        "email": "a@x.com",
        "password": "hunter22"
    });

    let (status, body) = post(&app, "/register", account.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, body) = post(&app, "/register", account).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Student ID or email already registered");

    let (_, body) = post(&app, "/login", json!({ "email": "a@x.com", "password": "wrong" })).await;
    assert_eq!(body, json!({ "success": false, "error": "Invalid email or password" }));

    let (_, body) = post(&app, "/login", json!({ "email": "a@x.com", "password": "hunter22" })).await;
    assert_eq!(
        body,
        json!({
            "success": true,
            "user": {
                "studentId": "S1",
                "fullName": "Sam Student",
                "phoneNumber": "555-0100",
                "email": "a@x.com"
            }
        })
    );
}

#[tokio::test]
async fn malformed_body_is_a_validation_failure() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid request body");
}

#[tokio::test]
async fn search_without_date_returns_empty_rides() {
    let app = test_app();
    let (status, body) = get(&app, "/search-rides?destination=station").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rides"], json!([]));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn posted_ride_is_searchable() {
    let app = test_app();
    post_ride(&app, json!("2")).await;

    let (_, body) = get(&app, "/search-rides?destination=CENTRAL&date=2024-10-01").await;
    let rides = body["rides"].as_array().unwrap();
    assert_eq!(rides.len(), 1);
    assert_eq!(rides[0]["destination"], "Central Station");
    assert_eq!(rides[0]["leaveTime"], "17:30");
    assert_eq!(rides[0]["seatsAvailable"], 2);

    let (_, body) = get(&app, "/search-rides?date=2024-10-02").await;
    assert_eq!(body, json!({ "rides": [] }));
}

#[tokio::test]
async fn booking_lifecycle_over_http() {
    let app = test_app();
    post_ride(&app, json!(1)).await;
    let ride_id = only_ride_id(&app).await;

    book(&app, &ride_id, "S2").await;
    book(&app, &ride_id, "S3").await;

    let (_, body) = get(&app, "/rider-bookings?studentId=R1").await;
    let bookings = body["bookings"].as_array().unwrap();
    assert_eq!(bookings.len(), 2);
    assert!(bookings.iter().all(|b| b["status"] == "pending"));
    let id_of = |seater: &str| {
        bookings
            .iter()
            .find(|b| b["seaterStudentId"] == seater)
            .and_then(|b| b["bookingId"].as_str())
            .unwrap()
            .to_string()
    };
    let first = id_of("S2");
    let second = id_of("S3");

    let (_, body) = post(&app, "/accept-booking", json!({ "bookingId": first })).await;
    assert_eq!(body, json!({ "success": true }));

    // Last seat is gone: the ride drops out of search and a second accept fails.
    let (_, body) = get(&app, "/search-rides?date=2024-10-01").await;
    assert_eq!(body["rides"], json!([]));
    let (_, body) = post(&app, "/accept-booking", json!({ "bookingId": second })).await;
    assert_eq!(body, json!({ "success": false, "error": "No seats available" }));

    let (_, body) = post(&app, "/reject-booking", json!({ "bookingId": second })).await;
    assert_eq!(body, json!({ "success": true }));
    let (_, body) = post(&app, "/reject-booking", json!({ "bookingId": second })).await;
    assert_eq!(body, json!({ "success": true }));

    let (_, body) = post(&app, "/cancel-booking", json!({ "bookingId": first })).await;
    assert_eq!(body, json!({ "success": true }));
    let (_, body) = get(&app, "/search-rides?date=2024-10-01").await;
    assert_eq!(body["rides"][0]["seatsAvailable"], 1);

    let (_, body) = get(&app, "/seater-bookings?studentId=S2").await;
    assert_eq!(body["bookings"], json!([]));
    let (_, body) = get(&app, "/seater-bookings?studentId=S3").await;
    let seen = &body["bookings"][0];
    assert_eq!(seen["status"], "rejected");
    assert_eq!(seen["source"], "Library");
    assert_eq!(seen["riderName"], "Rita");
    assert_eq!(seen["destination"], "Central Station");
}

#[tokio::test]
async fn bad_ids_are_reported_not_thrown() {
    let app = test_app();

    let (status, body) = post(&app, "/accept-booking", json!({ "bookingId": "not-a-uuid" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": false, "error": "Booking not found" }));

    let (_, body) = post(&app, "/cancel-booking", json!({})).await;
    assert_eq!(body["success"], false);

    let (_, body) = post(
        &app,
        "/confirm-booking",
        json!({
            "rideId": "00000000-0000-0000-0000-000000000000",
            "seaterName": "Sal",
            "seaterPhone": "555",
            "seaterStudentId": "S9"
        }),
    )
    .await;
    assert_eq!(body, json!({ "success": false, "error": "Ride not found" }));
}

#[tokio::test]
async fn listings_require_student_id() {
    let app = test_app();
    let (status, body) = get(&app, "/rider-bookings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bookings"], json!([]));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn cors_allows_the_frontend_origin() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/login")
        .header(header::ORIGIN, ORIGIN)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        ORIGIN
    );
}

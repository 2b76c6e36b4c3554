use axum::http::StatusCode;
use serial_test::serial;

use crate::common::{
    booking_payload, register_customer, seed_bookable_service, TestContext,
};

const CODE_ALPHABET: &str = "ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[tokio::test]
#[serial]
async fn create_booking_returns_created_with_pricing() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;

    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(customer["accessToken"].as_str().unwrap())
        .json(&booking_payload(service_id, 2, 3))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["subtotal"], "1399.00");
    assert_eq!(body["tax"], "167.88");
    assert_eq!(body["totalAmount"], "1566.88");
    assert_eq!(body["status"], "pending");
    assert_eq!(body["paymentStatus"], "pending");
    assert_eq!(body["customerId"], customer["user"]["id"]);
    assert_eq!(body["serviceTitle"], "Deep Cleaning");

    let code = body["bookingCode"].as_str().unwrap();
    assert_eq!(code.len(), 10);
    assert!(code.chars().all(|c| CODE_ALPHABET.contains(c)));

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_booking_rejects_unknown_service() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;

    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(customer["accessToken"].as_str().unwrap())
        .json(&booking_payload(999_999, 2, 3))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "BOOKING_SERVICE_UNAVAILABLE");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_booking_rejects_inactive_service() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;

    sqlx::query("UPDATE services SET is_active = FALSE WHERE id = ?")
        .bind(service_id)
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(customer["accessToken"].as_str().unwrap())
        .json(&booking_payload(service_id, 2, 3))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_booking_rejects_past_start() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;

    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(customer["accessToken"].as_str().unwrap())
        .json(&booking_payload(service_id, -1, 3))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "BOOKING_INVALID_SCHEDULE");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_booking_rejects_reversed_window() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;

    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(customer["accessToken"].as_str().unwrap())
        .json(&booking_payload(service_id, 2, -3))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_booking_requires_customer_role() {
    let ctx = TestContext::new().await;
    let (provider_session, service_id) = seed_bookable_service(&ctx).await;

    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(provider_session["accessToken"].as_str().unwrap())
        .json(&booking_payload(service_id, 2, 3))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn create_booking_requires_authentication() {
    let ctx = TestContext::new().await;
    let (_, service_id) = seed_bookable_service(&ctx).await;

    let response = ctx
        .server
        .post("/bookings")
        .json(&booking_payload(service_id, 2, 3))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);

    ctx.cleanup().await;
}

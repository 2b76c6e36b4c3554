use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use serial_test::serial;

use crate::common::{
    booking_payload, register_customer, seed_bookable_service, TestContext,
};

fn window_payload(
    service_id: u64,
    start: chrono::DateTime<Utc>,
    end: chrono::DateTime<Utc>,
) -> serde_json::Value {
    json!({
        "serviceId": service_id,
        "scheduledStart": start.to_rfc3339(),
        "scheduledEnd": end.to_rfc3339(),
        "addressLine1": "12 Test Lane",
        "city": "Lagos",
        "state": "Lagos",
        "country": "NG",
        "postalCode": "100001"
    })
}

#[tokio::test]
#[serial]
async fn overlapping_window_returns_conflict() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;
    let token = customer["accessToken"].as_str().unwrap();

    let start = Utc::now() + Duration::days(3);
    let end = start + Duration::hours(4);

    ctx.server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&window_payload(service_id, start, end))
        .await
        .assert_status(StatusCode::CREATED);

    // Second request overlaps the middle of the first window
    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&window_payload(
            service_id,
            start + Duration::hours(1),
            end + Duration::hours(1),
        ))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "BOOKING_SCHEDULE_CONFLICT");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn back_to_back_windows_do_not_conflict() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;
    let token = customer["accessToken"].as_str().unwrap();

    let start = Utc::now() + Duration::days(3);
    let boundary = start + Duration::hours(2);
    let end = boundary + Duration::hours(2);

    ctx.server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&window_payload(service_id, start, boundary))
        .await
        .assert_status(StatusCode::CREATED);

    // Half-open windows: one booking ending exactly when the next starts
    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&window_payload(service_id, boundary, end))
        .await;

    response.assert_status(StatusCode::CREATED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn cancelled_booking_does_not_block_window() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;
    let token = customer["accessToken"].as_str().unwrap();

    let start = Utc::now() + Duration::days(3);
    let end = start + Duration::hours(4);

    let first: serde_json::Value = ctx
        .server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&window_payload(service_id, start, end))
        .await
        .json();

    sqlx::query("UPDATE bookings SET status = 'cancelled' WHERE id = ?")
        .bind(first["id"].as_u64().unwrap())
        .execute(&ctx.db)
        .await
        .unwrap();

    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&window_payload(service_id, start, end))
        .await;

    response.assert_status(StatusCode::CREATED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn different_providers_share_the_window() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_a) = seed_bookable_service(&ctx).await;
    let (_, service_b) = seed_bookable_service(&ctx).await;
    let token = customer["accessToken"].as_str().unwrap();

    let start = Utc::now() + Duration::days(3);
    let end = start + Duration::hours(4);

    ctx.server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&window_payload(service_a, start, end))
        .await
        .assert_status(StatusCode::CREATED);

    let response = ctx
        .server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&window_payload(service_b, start, end))
        .await;

    response.assert_status(StatusCode::CREATED);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn concurrent_requests_for_same_window_yield_one_booking() {
    let ctx = TestContext::new().await;
    let customer_a = register_customer(&ctx).await;
    let customer_b = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;

    let payload = booking_payload(service_id, 3, 4);

    let (res_a, res_b) = tokio::join!(
        ctx.server
            .post("/bookings")
            .authorization_bearer(customer_a["accessToken"].as_str().unwrap())
            .json(&payload),
        ctx.server
            .post("/bookings")
            .authorization_bearer(customer_b["accessToken"].as_str().unwrap())
            .json(&payload)
    );

    // Exactly one success, one conflict: the loser of the lock race is
    // reported as a schedule conflict even when InnoDB kills its insert.
    let statuses = [res_a.status_code(), res_b.status_code()];
    assert!(statuses.contains(&StatusCode::CREATED), "{:?}", statuses);
    assert!(statuses.contains(&StatusCode::CONFLICT), "{:?}", statuses);

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookings")
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await;
}

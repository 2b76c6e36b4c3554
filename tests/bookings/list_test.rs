use axum::http::StatusCode;
use serial_test::serial;

use crate::common::{
    booking_payload, register_customer, seed_bookable_service, TestContext,
};

#[tokio::test]
#[serial]
async fn customer_list_returns_own_bookings_with_meta() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let other = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;
    let token = customer["accessToken"].as_str().unwrap();

    for day in 2..5 {
        ctx.server
            .post("/bookings")
            .authorization_bearer(token)
            .json(&booking_payload(service_id, day, 2))
            .await
            .assert_status(StatusCode::CREATED);
    }
    ctx.server
        .post("/bookings")
        .authorization_bearer(other["accessToken"].as_str().unwrap())
        .json(&booking_payload(service_id, 10, 2))
        .await
        .assert_status(StatusCode::CREATED);

    let response = ctx.server.get("/bookings").authorization_bearer(token).await;
    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["meta"]["total"], 3);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["pageSize"], 10);
    assert_eq!(body["meta"]["totalPages"], 1);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    for row in body["data"].as_array().unwrap() {
        assert_eq!(row["customerId"], customer["user"]["id"]);
        // Customer-facing reads never carry the customer contact block
        assert!(row.get("customer").is_none());
    }

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn list_clamps_page_size() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let token = customer["accessToken"].as_str().unwrap();

    let response = ctx
        .server
        .get("/bookings?page=0&pageSize=500")
        .authorization_bearer(token)
        .await;

    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["pageSize"], 50);
    assert_eq!(body["meta"]["totalPages"], 1);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn list_paginates_in_schedule_order() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;
    let token = customer["accessToken"].as_str().unwrap();

    for day in 2..5 {
        ctx.server
            .post("/bookings")
            .authorization_bearer(token)
            .json(&booking_payload(service_id, day, 2))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let page1: serde_json::Value = ctx
        .server
        .get("/bookings?page=1&pageSize=2")
        .authorization_bearer(token)
        .await
        .json();
    let page2: serde_json::Value = ctx
        .server
        .get("/bookings?page=2&pageSize=2")
        .authorization_bearer(token)
        .await
        .json();

    assert_eq!(page1["data"].as_array().unwrap().len(), 2);
    assert_eq!(page2["data"].as_array().unwrap().len(), 1);
    assert_eq!(page1["meta"]["totalPages"], 2);

    // Newest booking first; same-second creations fall back to id order
    let first_id = page1["data"][0]["id"].as_u64().unwrap();
    let second_id = page1["data"][1]["id"].as_u64().unwrap();
    let third_id = page2["data"][0]["id"].as_u64().unwrap();
    assert!(first_id > second_id);
    assert!(second_id > third_id);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn list_filters_by_status() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (_, service_id) = seed_bookable_service(&ctx).await;
    let token = customer["accessToken"].as_str().unwrap();

    let created: serde_json::Value = ctx
        .server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&booking_payload(service_id, 2, 2))
        .await
        .json();
    ctx.server
        .post("/bookings")
        .authorization_bearer(token)
        .json(&booking_payload(service_id, 4, 2))
        .await
        .assert_status(StatusCode::CREATED);

    sqlx::query("UPDATE bookings SET status = 'confirmed' WHERE id = ?")
        .bind(created["id"].as_u64().unwrap())
        .execute(&ctx.db)
        .await
        .unwrap();

    let body: serde_json::Value = ctx
        .server
        .get("/bookings?status=confirmed")
        .authorization_bearer(token)
        .await
        .json();

    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["status"], "confirmed");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn list_rejects_unknown_status_filter() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;

    let response = ctx
        .server
        .get("/bookings?status=abandoned")
        .authorization_bearer(customer["accessToken"].as_str().unwrap())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "BOOKING_INVALID_STATUS_FILTER");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn provider_list_scopes_to_own_schedule() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;
    let (provider_session, service_id) = seed_bookable_service(&ctx).await;
    let (other_provider, _) = seed_bookable_service(&ctx).await;

    ctx.server
        .post("/bookings")
        .authorization_bearer(customer["accessToken"].as_str().unwrap())
        .json(&booking_payload(service_id, 2, 2))
        .await
        .assert_status(StatusCode::CREATED);

    let body: serde_json::Value = ctx
        .server
        .get("/provider/bookings")
        .authorization_bearer(provider_session["accessToken"].as_str().unwrap())
        .await
        .json();
    assert_eq!(body["meta"]["total"], 1);
    // Provider listings expose who booked
    let contact = &body["data"][0]["customer"];
    assert_eq!(contact["email"], customer["user"]["email"]);
    assert_eq!(contact["phone"], customer["user"]["phone"]);
    assert_eq!(contact["firstName"], "Test");

    let empty: serde_json::Value = ctx
        .server
        .get("/provider/bookings")
        .authorization_bearer(other_provider["accessToken"].as_str().unwrap())
        .await
        .json();
    assert_eq!(empty["meta"]["total"], 0);
    assert_eq!(empty["meta"]["totalPages"], 1);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn provider_list_rejects_customer_role() {
    let ctx = TestContext::new().await;
    let customer = register_customer(&ctx).await;

    let response = ctx
        .server
        .get("/provider/bookings")
        .authorization_bearer(customer["accessToken"].as_str().unwrap())
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    ctx.cleanup().await;
}

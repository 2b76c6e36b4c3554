use axum::http::StatusCode;
use serial_test::serial;
use serde_json::json;

use crate::common::{register_customer, TestContext};

#[tokio::test]
#[serial]
async fn refresh_rotates_token() {
    let ctx = TestContext::new().await;
    let session = register_customer(&ctx).await;
    let refresh_token = session["refreshToken"].as_str().unwrap();

    let response = ctx
        .server
        .post("/auth/refresh")
        .json(&json!({ "refreshToken": refresh_token }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body["accessToken"].as_str().is_some());
    assert_ne!(body["refreshToken"].as_str().unwrap(), refresh_token);
    assert_eq!(body["user"]["id"], session["user"]["id"]);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn refresh_rejects_reused_token() {
    let ctx = TestContext::new().await;
    let session = register_customer(&ctx).await;
    let refresh_token = session["refreshToken"].as_str().unwrap();

    ctx.server
        .post("/auth/refresh")
        .json(&json!({ "refreshToken": refresh_token }))
        .await
        .assert_status(StatusCode::OK);

    // Strict rotation: the spent token is gone
    let response = ctx
        .server
        .post("/auth/refresh")
        .json(&json!({ "refreshToken": refresh_token }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "AUTH_REFRESH_NOT_FOUND");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn refresh_rejects_malformed_token() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/refresh")
        .json(&json!({ "refreshToken": "not-a-refresh-token" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "AUTH_INVALID_REFRESH_TOKEN");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn refresh_rejects_unknown_token() {
    let ctx = TestContext::new().await;

    // Well-formed but never issued
    let response = ctx
        .server
        .post("/auth/refresh")
        .json(&json!({ "refreshToken": "a".repeat(64) }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "AUTH_REFRESH_NOT_FOUND");

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn concurrent_refresh_rotates_exactly_once() {
    let ctx = TestContext::new().await;
    let session = register_customer(&ctx).await;
    let refresh_token = session["refreshToken"].as_str().unwrap();

    let (res1, res2) = tokio::join!(
        ctx.server
            .post("/auth/refresh")
            .json(&json!({ "refreshToken": refresh_token })),
        ctx.server
            .post("/auth/refresh")
            .json(&json!({ "refreshToken": refresh_token }))
    );

    let statuses = [res1.status_code(), res2.status_code()];
    let ok = statuses
        .iter()
        .filter(|s| **s == StatusCode::OK)
        .count();
    assert_eq!(ok, 1, "exactly one rotation must win: {:?}", statuses);
    assert!(statuses.contains(&StatusCode::UNAUTHORIZED));

    // Only the winner's replacement token is live
    let (live,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM refresh_tokens WHERE user_id = ? AND revoked_at IS NULL",
    )
    .bind(session["user"]["id"].as_u64().unwrap())
    .fetch_one(&ctx.db)
    .await
    .unwrap();
    assert_eq!(live, 1);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn refreshed_access_token_is_accepted() {
    let ctx = TestContext::new().await;
    let session = register_customer(&ctx).await;
    let refresh_token = session["refreshToken"].as_str().unwrap();

    let refreshed: serde_json::Value = ctx
        .server
        .post("/auth/refresh")
        .json(&json!({ "refreshToken": refresh_token }))
        .await
        .json();

    let response = ctx
        .server
        .get("/users/me")
        .authorization_bearer(refreshed["accessToken"].as_str().unwrap())
        .await;

    response.assert_status(StatusCode::OK);

    ctx.cleanup().await;
}

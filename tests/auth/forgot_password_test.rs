use axum::http::StatusCode;
use serial_test::serial;
use serde_json::json;

use crate::common::{customer_payload, test_email, test_phone, TestContext};

#[tokio::test]
#[serial]
async fn forgot_password_issues_token_in_development() {
    let ctx = TestContext::new().await;
    let email = test_email();

    ctx.server
        .post("/auth/register")
        .json(&customer_payload(&email, &test_phone()))
        .await;

    let response = ctx
        .server
        .post("/auth/forgot-password")
        .json(&json!({ "identifier": &email }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["resetToken"].as_str().unwrap().len(), 32);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn forgot_password_answers_identically_for_unknown_account() {
    let ctx = TestContext::new().await;

    let response = ctx
        .server
        .post("/auth/forgot-password")
        .json(&json!({ "identifier": test_email() }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert!(body["message"].as_str().is_some());
    assert!(body.get("resetToken").is_none());

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn forgot_password_stores_only_token_hash() {
    let ctx = TestContext::new().await;
    let email = test_email();

    let register: serde_json::Value = ctx
        .server
        .post("/auth/register")
        .json(&customer_payload(&email, &test_phone()))
        .await
        .json();
    let user_id = register["user"]["id"].as_u64().unwrap();

    let body: serde_json::Value = ctx
        .server
        .post("/auth/forgot-password")
        .json(&json!({ "identifier": &email }))
        .await
        .json();
    let raw_token = body["resetToken"].as_str().unwrap();

    let (stored_hash,): (String,) =
        sqlx::query_as("SELECT token_hash FROM password_reset_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();

    assert_ne!(stored_hash, raw_token);
    assert_eq!(stored_hash.len(), 64);

    ctx.cleanup().await;
}

#[tokio::test]
#[serial]
async fn forgot_password_replaces_unused_token() {
    let ctx = TestContext::new().await;
    let email = test_email();

    let register: serde_json::Value = ctx
        .server
        .post("/auth/register")
        .json(&customer_payload(&email, &test_phone()))
        .await
        .json();
    let user_id = register["user"]["id"].as_u64().unwrap();

    for _ in 0..2 {
        ctx.server
            .post("/auth/forgot-password")
            .json(&json!({ "identifier": &email }))
            .await
            .assert_status(StatusCode::OK);
    }

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM password_reset_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&ctx.db)
            .await
            .unwrap();
    assert_eq!(count, 1);

    ctx.cleanup().await;
}

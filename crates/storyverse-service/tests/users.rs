//! User registration and admin user management integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn register_and_fetch_me() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/users")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "email": "reader@example.com" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["coins"], 0);
    assert_eq!(body["plan"], "free");
    assert_eq!(body["email"], "reader@example.com");

    let response = harness
        .server
        .get("/api/users/me")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["id"], harness.test_user_id.to_string());
}

#[tokio::test]
async fn register_twice_conflicts() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .post("/api/users")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn me_without_registration_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/api/users/me")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let harness = TestHarness::new();

    let response = harness.server.get("/api/users/me").await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Admin user management
// ============================================================================

#[tokio::test]
async fn admin_lists_users() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .get("/api/admin/users")
        .add_header("authorization", harness.admin_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .get("/api/admin/users")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_forbidden();
}

#[tokio::test]
async fn admin_upgrades_plan() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .patch(&format!("/api/admin/users/{}", harness.test_user_id))
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({ "plan": "premium" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["plan"], "premium");
}

#[tokio::test]
async fn admin_update_unknown_user_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .patch(&format!(
            "/api/admin/users/{}",
            storyverse_core::UserId::generate()
        ))
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({ "is_admin": true }))
        .await;

    response.assert_status_not_found();
}

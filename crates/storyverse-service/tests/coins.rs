//! Coin ledger integration tests: summaries, adjustments, refunds and
//! transaction history.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

// ============================================================================
// Summary
// ============================================================================

#[tokio::test]
async fn summary_starts_at_zero() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .get("/api/coins/summary")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["available"], 0);
    assert_eq!(body["used"], 0);
    assert_eq!(body["earned"], 0);
}

#[tokio::test]
async fn summary_without_registration_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/api/coins/summary")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn admin_reads_any_users_summary() {
    let harness = TestHarness::new();
    harness.register_user().await;
    harness.fund_user(75).await;

    let response = harness
        .server
        .get(&format!(
            "/api/admin/coins/summary?user_id={}",
            harness.test_user_id
        ))
        .add_header("authorization", harness.admin_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["available"], 75);
    assert_eq!(body["earned"], 75);
}

// ============================================================================
// Adjustments
// ============================================================================

#[tokio::test]
async fn adjust_changes_balance_and_appends_transaction() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .post("/api/admin/coins/adjust")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "delta": 50,
            "reason": "welcome bonus"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 50);
    assert_eq!(body["transaction"]["coins"], 50);
    assert_eq!(body["transaction"]["kind"], "adjust");

    // Cached balance and recomputed summary agree
    assert_eq!(harness.balance().await, 50);
}

#[tokio::test]
async fn adjust_zero_delta_is_rejected() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .post("/api/admin/coins/adjust")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "delta": 0,
            "reason": "noop"
        }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn adjust_below_zero_reports_figures_and_changes_nothing() {
    let harness = TestHarness::new();
    harness.register_user().await;
    harness.fund_user(150).await;

    let response = harness
        .server
        .post("/api/admin/coins/adjust")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "delta": -200,
            "reason": "overdraw attempt"
        }))
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "INSUFFICIENT_COINS");
    assert_eq!(body["available"], 150);
    assert_eq!(body["required"], 200);

    assert_eq!(harness.balance().await, 150);
}

#[tokio::test]
async fn adjust_requires_admin() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .post("/api/admin/coins/adjust")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "delta": 1_000_000,
            "reason": "self-serve"
        }))
        .await;

    response.assert_status_forbidden();
}

// ============================================================================
// Refunds
// ============================================================================

#[tokio::test]
async fn refund_reverses_exactly_once() {
    let harness = TestHarness::new();
    harness.register_user().await;

    let response = harness
        .server
        .post("/api/admin/coins/adjust")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "delta": 20,
            "reason": "promo"
        }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let tx_id = body["transaction"]["id"].as_str().unwrap().to_string();

    // First refund succeeds
    let response = harness
        .server
        .post("/api/admin/coins/refund")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({ "transaction_id": tx_id }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 0);
    assert_eq!(body["transaction"]["coins"], -20);
    assert_eq!(body["transaction"]["refund_of"], tx_id.as_str());

    // Second refund is rejected, balance reflects exactly one reversal
    let response = harness
        .server
        .post("/api/admin/coins/refund")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({ "transaction_id": tx_id }))
        .await;
    response.assert_status(StatusCode::CONFLICT);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "already_refunded");

    assert_eq!(harness.balance().await, 0);
}

#[tokio::test]
async fn refund_rejected_when_coins_were_spent() {
    let harness = TestHarness::new();
    harness.register_user().await;

    // Earn 20, spend down to 10
    let response = harness
        .server
        .post("/api/admin/coins/adjust")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "delta": 20,
            "reason": "grant"
        }))
        .await;
    let body: serde_json::Value = response.json();
    let grant_tx = body["transaction"]["id"].as_str().unwrap().to_string();

    harness.fund_user(-10).await;

    let response = harness
        .server
        .post("/api/admin/coins/refund")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({ "transaction_id": grant_tx }))
        .await;

    response.assert_status(StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "INSUFFICIENT_COINS");
    assert_eq!(body["available"], 10);
    assert_eq!(body["required"], 20);

    assert_eq!(harness.balance().await, 10);
}

#[tokio::test]
async fn refund_unknown_transaction_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/admin/coins/refund")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({
            "transaction_id": storyverse_core::TransactionId::generate().to_string()
        }))
        .await;

    response.assert_status_not_found();
}

// ============================================================================
// Transaction history
// ============================================================================

#[tokio::test]
async fn transactions_list_newest_first_with_has_more() {
    let harness = TestHarness::new();
    harness.register_user().await;
    // Sleep between grants so the ULID timestamps differ
    for delta in [10, 20, 30] {
        harness.fund_user(delta).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let response = harness
        .server
        .get("/api/coins/transactions?limit=2&offset=0")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(transactions[0]["coins"], 30);
    assert_eq!(transactions[1]["coins"], 20);
    assert_eq!(body["has_more"], true);
}

#[tokio::test]
async fn admin_searches_ledger_by_reason() {
    let harness = TestHarness::new();
    harness.register_user().await;
    harness.fund_user(10).await;

    let response = harness
        .server
        .post("/api/admin/coins/adjust")
        .add_header("authorization", harness.admin_auth_header())
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "delta": 5,
            "reason": "launch promo"
        }))
        .await;
    response.assert_status_ok();

    let response = harness
        .server
        .get(&format!(
            "/api/admin/coins/transactions?q=promo&user_id={}",
            harness.test_user_id
        ))
        .add_header("authorization", harness.admin_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["reason"], "launch promo");
}

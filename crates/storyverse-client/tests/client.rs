//! Client SDK tests against a mocked Storyverse service.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storyverse_client::{ClientError, StoryverseClient};

#[tokio::test]
async fn coin_summary_deserializes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/coins/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "available": 50,
            "used": 100,
            "earned": 150
        })))
        .mount(&server)
        .await;

    let client = StoryverseClient::new(server.uri());
    let summary = client.coin_summary("token").await.unwrap();

    assert_eq!(summary.available, 50);
    assert_eq!(summary.used, 100);
    assert_eq!(summary.earned, 150);
}

#[tokio::test]
async fn short_balance_maps_to_insufficient_coins() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/runs/run-1/unlock"))
        .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
            "error": "INSUFFICIENT_COINS",
            "available": 40,
            "required": 100
        })))
        .mount(&server)
        .await;

    let client = StoryverseClient::new(server.uri());
    let err = client.unlock("token", "run-1", 3).await.unwrap_err();

    match err {
        ClientError::InsufficientCoins {
            available,
            required,
        } => {
            assert_eq!(available, 40);
            assert_eq!(required, 100);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn locked_chapter_maps_to_chapter_locked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/runs/run-1/current"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "CHAPTER_LOCKED",
            "chapterNumber": 3,
            "requiredCoins": 100,
            "available": 0
        })))
        .mount(&server)
        .await;

    let client = StoryverseClient::new(server.uri());
    let err = client.current_node("token", "run-1").await.unwrap_err();

    match err {
        ClientError::ChapterLocked {
            chapter,
            required,
            available,
        } => {
            assert_eq!(chapter, 3);
            assert_eq!(required, 100);
            assert_eq!(available, 0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn envelope_errors_map_to_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/runs/run-1/unlock"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "error": {
                "code": "already_unlocked",
                "message": "Chapter 3 is already unlocked"
            }
        })))
        .mount(&server)
        .await;

    let client = StoryverseClient::new(server.uri());
    let err = client.unlock("token", "run-1", 3).await.unwrap_err();

    match err {
        ClientError::Api { code, status, .. } => {
            assert_eq!(code, "already_unlocked");
            assert_eq!(status, 409);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rate_outcome_deserializes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/runs/run-1/rate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "coinsAwarded": 2
        })))
        .mount(&server)
        .await;

    let client = StoryverseClient::new(server.uri());
    let outcome = client.rate("token", "run-1", "ch1-fantasy", 5).await.unwrap();

    assert!(outcome.ok);
    assert_eq!(outcome.coins_awarded, 2);
}

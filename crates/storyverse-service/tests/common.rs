//! Common test utilities for storyverse integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;

use storyverse_core::{default_rules, UserId};
use storyverse_service::{create_router, AppState, ServiceConfig};
use storyverse_store::{RocksStore, Store};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store handle for invariant assertions.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
    /// A test administrator ID for admin requests.
    pub admin_user_id: UserId,
}

impl TestHarness {
    /// Create a new test harness with a fresh database and seeded rules.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));
        store
            .seed_rules(&default_rules())
            .expect("Failed to seed rules");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            allow_test_tokens: true,
            ..ServiceConfig::default()
        };

        let state = AppState::new(Arc::clone(&store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            test_user_id: UserId::generate(),
            admin_user_id: UserId::generate(),
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer test-token:{}", self.test_user_id)
    }

    /// Get the authorization header for admin authentication.
    pub fn admin_auth_header(&self) -> String {
        format!("Bearer test-admin:{}", self.admin_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        let other_user = UserId::generate();
        format!("Bearer test-token:{other_user}")
    }

    /// Register the test user.
    pub async fn register_user(&self) {
        self.server
            .post("/api/users")
            .add_header("authorization", self.user_auth_header())
            .json(&json!({}))
            .await
            .assert_status_ok();
    }

    /// Grant the test user coins through the admin adjustment endpoint, so
    /// the balance stays consistent with the transaction log.
    pub async fn fund_user(&self, coins: i64) {
        self.server
            .post("/api/admin/coins/adjust")
            .add_header("authorization", self.admin_auth_header())
            .json(&json!({
                "user_id": self.test_user_id.to_string(),
                "delta": coins,
                "reason": "test funding"
            }))
            .await
            .assert_status_ok();
    }

    /// Create a genre through the admin endpoint.
    pub async fn create_genre(&self, slug: &str) {
        self.server
            .post("/api/admin/genres")
            .add_header("authorization", self.admin_auth_header())
            .json(&json!({ "slug": slug, "label": slug }))
            .await
            .assert_status_ok();
    }

    /// Register the test user and start a run, returning the run id.
    pub async fn start_run(&self) -> String {
        self.register_user().await;

        let response = self
            .server
            .post("/api/runs")
            .add_header("authorization", self.user_auth_header())
            .await;
        response.assert_status_ok();

        let body: serde_json::Value = response.json();
        body["runId"].as_str().expect("runId in response").to_string()
    }

    /// The test user's current balance as the API reports it.
    pub async fn balance(&self) -> i64 {
        let response = self
            .server
            .get("/api/coins/summary")
            .add_header("authorization", self.user_auth_header())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["available"].as_i64().expect("available in summary")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

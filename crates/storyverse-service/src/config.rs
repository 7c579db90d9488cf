//! Service configuration.

use storyverse_core::DEFAULT_CHAPTER_UNLOCK_COST;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/storyverse").
    pub data_dir: String,

    /// HS256 secret for validating bearer JWTs. When unset, only test
    /// tokens (if allowed) can authenticate.
    pub jwt_secret: Option<String>,

    /// Accept `test-token:<uuid>` / `test-admin:<uuid>` bearer tokens.
    /// Never enable in production.
    pub allow_test_tokens: bool,

    /// Coin cost of unlocking a paid chapter.
    pub chapter_unlock_cost: i64,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/storyverse".into()),
            jwt_secret: std::env::var("JWT_SECRET").ok(),
            allow_test_tokens: std::env::var("ALLOW_TEST_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            chapter_unlock_cost: std::env::var("CHAPTER_UNLOCK_COST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CHAPTER_UNLOCK_COST),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/storyverse".into(),
            jwt_secret: None,
            allow_test_tokens: false,
            chapter_unlock_cost: DEFAULT_CHAPTER_UNLOCK_COST,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}

//! Application state.

use std::sync::Arc;

use storyverse_store::RocksStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        if config.allow_test_tokens {
            tracing::warn!("Test-token authentication enabled - do not use in production");
        }
        if config.jwt_secret.is_none() {
            tracing::warn!("JWT_SECRET not configured - JWT authentication disabled");
        }

        Self { store, config }
    }
}

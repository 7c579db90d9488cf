//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{coins, genres, health, rules, runs, users};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /api/genres` - List genres
///
/// ## Users (bearer auth)
/// - `POST /api/users` - Register
/// - `GET /api/users/me` - Current user
/// - `GET /api/coins/summary` - Own coin summary
/// - `GET /api/coins/transactions` - Own transaction history
///
/// ## Runs (bearer auth)
/// - `POST /api/runs` - Start a run
/// - `GET /api/runs/:run_id/current` - Current node (may be CHAPTER_LOCKED)
/// - `POST /api/runs/:run_id/choose` - Choose a genre path
/// - `POST /api/runs/:run_id/rate` - Rate a chapter node
/// - `POST /api/runs/:run_id/unlock` - Purchase a chapter unlock
///
/// ## Admin (bearer auth with admin claim)
/// - `GET /api/admin/users`, `PATCH /api/admin/users/:id`
/// - `GET /api/admin/coins/summary` - Any user's summary
/// - `GET /api/admin/coins/transactions` - Ledger search
/// - `POST /api/admin/coins/adjust` - Balance adjustment
/// - `POST /api/admin/coins/refund` - Reverse a transaction
/// - `GET/POST /api/admin/reward-rules`, `GET/PATCH /api/admin/reward-rules/:key`
/// - `POST /api/admin/genres`, `DELETE /api/admin/genres/:slug`
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Users
        .route("/api/users", post(users::register))
        .route("/api/users/me", get(users::me))
        // Coins (own)
        .route("/api/coins/summary", get(coins::get_summary))
        .route("/api/coins/transactions", get(coins::list_transactions))
        // Genres
        .route("/api/genres", get(genres::list_genres))
        // Runs
        .route("/api/runs", post(runs::create_run))
        .route("/api/runs/:run_id/current", get(runs::current))
        .route("/api/runs/:run_id/choose", post(runs::choose))
        .route("/api/runs/:run_id/rate", post(runs::rate))
        .route("/api/runs/:run_id/unlock", post(runs::unlock))
        // Admin: users
        .route("/api/admin/users", get(users::list_users))
        .route("/api/admin/users/:user_id", patch(users::update_user))
        // Admin: coins
        .route("/api/admin/coins/summary", get(coins::admin_summary))
        .route(
            "/api/admin/coins/transactions",
            get(coins::admin_transactions),
        )
        .route("/api/admin/coins/adjust", post(coins::adjust))
        .route("/api/admin/coins/refund", post(coins::refund))
        // Admin: reward rules
        .route(
            "/api/admin/reward-rules",
            get(rules::list_rules).post(rules::create_rule),
        )
        .route(
            "/api/admin/reward-rules/:key",
            get(rules::get_rule).patch(rules::update_rule),
        )
        // Admin: genres
        .route("/api/admin/genres", post(genres::create_genre))
        .route("/api/admin/genres/:slug", delete(genres::delete_genre))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

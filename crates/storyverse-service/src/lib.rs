//! Storyverse HTTP API Service.
//!
//! This crate provides the HTTP API for the Storyverse coin ledger and
//! chapter gate, including:
//!
//! - User registration and admin user management
//! - Coin balance summaries and transaction history
//! - Administrator balance adjustments and refunds
//! - Reward rule and genre configuration
//! - Story runs: choosing paths, rating chapters, unlocking paid chapters
//!
//! # Authentication
//!
//! Requests carry a bearer token: an HS256 JWT whose `sub` claim is the user
//! id and whose `admin` claim authorizes the admin routes. A `test-token:` /
//! `test-admin:` scheme can be enabled in configuration for test servers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Simple handlers stay async for consistency

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;

//! Authentication extractors.
//!
//! This module provides extractors for:
//! - `AuthUser` - any authenticated user (bearer JWT or test token)
//! - `AdminUser` - an authenticated user whose token carries the admin claim

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use storyverse_core::UserId;

use crate::config::ServiceConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// JWT claims for Storyverse bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Whether the token authorizes admin routes.
    #[serde(default)]
    pub admin: bool,
    /// Expiration time (seconds since epoch).
    pub exp: i64,
    /// Issued at (seconds since epoch).
    pub iat: i64,
}

/// An authenticated user extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// Whether the token carries the admin claim.
    pub is_admin: bool,
}

fn authenticate(parts: &Parts, config: &ServiceConfig) -> Result<AuthUser, ApiError> {
    let auth_header = parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    // Test tokens carry the user id inline; only honored when explicitly
    // allowed in configuration.
    if config.allow_test_tokens {
        if let Some(user_id_str) = token.strip_prefix("test-token:") {
            let user_id = user_id_str
                .parse::<UserId>()
                .map_err(|_| ApiError::Unauthorized)?;
            return Ok(AuthUser {
                user_id,
                is_admin: false,
            });
        }
        if let Some(user_id_str) = token.strip_prefix("test-admin:") {
            let user_id = user_id_str
                .parse::<UserId>()
                .map_err(|_| ApiError::Unauthorized)?;
            return Ok(AuthUser {
                user_id,
                is_admin: true,
            });
        }
    }

    let secret = config.jwt_secret.as_ref().ok_or(ApiError::Unauthorized)?;

    let data = jsonwebtoken::decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    let user_id = data
        .claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        is_admin: data.claims.admin,
    })
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, &state.config)
    }
}

/// An authenticated administrator.
///
/// Wraps `AuthUser` and rejects tokens without the admin claim.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, &state.config)?;
        if !user.is_admin {
            return Err(ApiError::Forbidden);
        }
        Ok(Self(user))
    }
}

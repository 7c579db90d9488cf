//! User registration and admin user management handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use storyverse_core::{Plan, User, UserId};
use storyverse_store::Store;

use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// User response.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: String,
    /// Contact email, if any.
    pub email: Option<String>,
    /// Current coin balance.
    pub coins: i64,
    /// Current plan.
    pub plan: Plan,
    /// Whether the user is an administrator.
    pub is_admin: bool,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            coins: user.coins,
            plan: user.plan,
            is_admin: user.is_admin,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Register request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Optional contact email.
    pub email: Option<String>,
}

/// Register the authenticated user.
pub async fn register(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RegisterRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if state.store.get_user(&auth.user_id)?.is_some() {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let user = User::new(auth.user_id, body.email);
    state.store.put_user(&user)?;

    tracing::info!(user_id = %auth.user_id, "User registered");

    Ok(Json(UserResponse::from(&user)))
}

/// Get the current user's record.
pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .store
        .get_user(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(UserResponse::from(&user)))
}

/// User list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Maximum number of users to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// List users response.
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    /// Users (store order).
    pub users: Vec<UserResponse>,
    /// Whether there are more users.
    pub has_more: bool,
}

/// List users (admin).
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let users = state.store.list_users(limit + 1, query.offset)?;

    let has_more = users.len() > limit;
    let users: Vec<_> = users.iter().take(limit).map(UserResponse::from).collect();

    Ok(Json(ListUsersResponse { users, has_more }))
}

/// Admin user update request.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New plan, if changing.
    pub plan: Option<Plan>,
    /// New admin flag, if changing.
    pub is_admin: Option<bool>,
}

/// Update a user's plan or admin flag (admin).
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = user_id
        .parse::<UserId>()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let mut user = state
        .store
        .get_user(&user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if let Some(plan) = body.plan {
        user.plan = plan;
    }
    if let Some(is_admin) = body.is_admin {
        user.is_admin = is_admin;
    }
    user.updated_at = chrono::Utc::now();

    state.store.put_user(&user)?;

    tracing::info!(
        user_id = %user_id,
        admin = %admin.0.user_id,
        plan = ?user.plan,
        is_admin = %user.is_admin,
        "User updated"
    );

    Ok(Json(UserResponse::from(&user)))
}

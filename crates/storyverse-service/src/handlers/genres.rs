//! Genre management handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use storyverse_core::Genre;
use storyverse_store::Store;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::state::AppState;

/// List genres response.
#[derive(Debug, Serialize)]
pub struct ListGenresResponse {
    /// All genres, ordered by slug.
    pub genres: Vec<Genre>,
}

/// List genres (public - the reading UI shows these as path choices).
pub async fn list_genres(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListGenresResponse>, ApiError> {
    let genres = state.store.list_genres()?;
    Ok(Json(ListGenresResponse { genres }))
}

/// Create genre request.
#[derive(Debug, Deserialize)]
pub struct CreateGenreRequest {
    /// URL-safe identifier.
    pub slug: String,
    /// Display label.
    pub label: String,
}

/// Create a genre (admin).
pub async fn create_genre(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Json(body): Json<CreateGenreRequest>,
) -> Result<Json<Genre>, ApiError> {
    if body.slug.trim().is_empty() {
        return Err(ApiError::BadRequest("Genre slug is required".into()));
    }
    if state.store.get_genre(&body.slug)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Genre already exists: {}",
            body.slug
        )));
    }

    let genre = Genre {
        slug: body.slug,
        label: body.label,
    };
    state.store.put_genre(&genre)?;

    tracing::info!(genre = %genre.slug, admin = %admin.0.user_id, "Genre created");

    Ok(Json(genre))
}

/// Delete a genre (admin).
pub async fn delete_genre(
    State(state): State<Arc<AppState>>,
    admin: AdminUser,
    Path(slug): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete_genre(&slug)?;

    tracing::info!(genre = %slug, admin = %admin.0.user_id, "Genre deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

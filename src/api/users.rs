//! User profile endpoints
//!
//! Profiles are owned by the external identity provider; this surface
//! only mirrors them so feed responses can embed author details.

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::Utc;

use crate::AppState;
use crate::auth::CurrentUser;
use crate::data::User;
use crate::error::AppError;

use super::converters;
use super::dto::*;

/// POST /users
///
/// Upsert the caller's mirrored profile. The id always comes from the
/// authenticated principal, never the body.
pub async fn sync_user(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<SyncUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let username = body.username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }

    let now = Utc::now();
    let created_at = match state.db.get_user(&user_id).await? {
        Some(existing) => existing.created_at,
        None => now,
    };

    let user = User {
        id: user_id,
        username: username.to_string(),
        first_name: body.first_name,
        last_name: body.last_name,
        profile_picture: body.profile_picture,
        created_at,
        updated_at: now,
    };
    state.db.upsert_user(&user).await?;

    Ok(Json(converters::user_to_response(&user)))
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(_caller_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.db.get_user(&id).await?.ok_or(AppError::NotFound)?;

    Ok(Json(converters::user_to_response(&user)))
}

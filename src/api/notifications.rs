//! Notification endpoints

use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::NotificationService;

use super::converters;
use super::dto::*;

/// GET /notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Vec<NotificationResponse>>, AppError> {
    let cap = state.config.feed.notifications_cap;
    let limit = params.limit.unwrap_or(20).clamp(1, cap);

    let notification_service = NotificationService::new(state.db.clone());
    let notifications = notification_service.list_for(&user_id, limit).await?;

    Ok(Json(
        notifications
            .iter()
            .map(converters::notification_to_response)
            .collect(),
    ))
}

/// PATCH /notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, AppError> {
    let notification_service = NotificationService::new(state.db.clone());
    notification_service.mark_read(&user_id, &id).await?;

    let notification = state
        .db
        .get_notification(&id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(Json(converters::notification_to_response(&notification)))
}

/// GET /notifications/unread_count
pub async fn get_unread_count(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<serde_json::Value>, AppError> {
    let notification_service = NotificationService::new(state.db.clone());
    let count = notification_service.unread_count(&user_id).await?;

    Ok(Json(serde_json::json!({
        "count": count
    })))
}

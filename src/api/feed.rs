//! Feed endpoints

use axum::{
    extract::{Query, State},
    response::Json,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::{HTTP_REQUEST_DURATION_SECONDS, HTTP_REQUESTS_TOTAL};
use crate::pagination::FeedCursor;
use crate::service::{FeedService, PreferenceService};

use super::converters;
use super::dto::*;

/// GET /feed
pub async fn get_feed(
    State(state): State<AppState>,
    CurrentUser(viewer_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<FeedResponse>, AppError> {
    // Start timing the request
    let _timer = HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&["GET", "/feed"])
        .start_timer();

    // Opaque token; a malformed one restarts from the first page rather
    // than failing the request.
    let cursor = FeedCursor::decode_or_first_page(params.cursor.as_deref());
    let limit = params
        .limit
        .unwrap_or(state.config.feed.default_page_size)
        .clamp(1, state.config.feed.max_page_size);

    let feed_service = FeedService::new(state.db.clone());
    let page = feed_service.assemble(&viewer_id, &cursor, limit).await?;

    // Hydrate author profiles for the page in one query
    let mut author_ids: Vec<String> = page.posts.iter().map(|p| p.author_id.clone()).collect();
    author_ids.sort_unstable();
    author_ids.dedup();
    let users = state.db.get_users_by_ids(&author_ids).await?;

    let posts = page
        .posts
        .iter()
        .map(|post| converters::post_to_response(post, &users))
        .collect();

    // Record successful request
    HTTP_REQUESTS_TOTAL
        .with_label_values(&["GET", "/feed", "200"])
        .inc();

    Ok(Json(FeedResponse {
        posts,
        next_cursor: page.next_cursor.map(|cursor| cursor.encode()),
    }))
}

/// GET /feed/preferences
pub async fn get_preferences(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<PreferencesResponse>, AppError> {
    let preference_service = PreferenceService::new(state.db.clone());
    let preference = preference_service.get(&user_id).await?;

    Ok(Json(PreferencesResponse {
        tags: preference.tags,
        backfill: preference.backfill,
    }))
}

/// POST /feed/preferences
pub async fn update_preferences(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<UpdatePreferencesRequest>,
) -> Result<Json<PreferencesResponse>, AppError> {
    let preference_service = PreferenceService::new(state.db.clone());
    let preference = preference_service
        .save(&user_id, body.tags, body.backfill)
        .await?;

    Ok(Json(PreferencesResponse {
        tags: preference.tags,
        backfill: preference.backfill,
    }))
}

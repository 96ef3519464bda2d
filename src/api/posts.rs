//! Post endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::pagination::CursorPos;
use crate::service::{NewPost, PostService};

use super::converters;
use super::dto::*;

/// POST /posts
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(author_id): CurrentUser,
    Json(body): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostResponse>), AppError> {
    let post_service = PostService::new(state.db.clone());
    let post = post_service
        .create(
            &author_id,
            NewPost {
                content: body.content,
                image_url: body.image_url,
                tags: body.tags,
            },
        )
        .await?;

    let users = state.db.get_users_by_ids(&[author_id]).await?;

    Ok((
        StatusCode::CREATED,
        Json(converters::post_to_response(&post, &users)),
    ))
}

/// GET /posts/:id
pub async fn get_post(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<PostResponse>, AppError> {
    let post_service = PostService::new(state.db.clone());
    let post = post_service.get(&id).await?;

    let users = state.db.get_users_by_ids(&[post.author_id.clone()]).await?;

    Ok(Json(converters::post_to_response(&post, &users)))
}

/// DELETE /posts/:id
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let post_service = PostService::new(state.db.clone());
    post_service.delete(&user_id, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/:id/posts
pub async fn user_posts(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Path(author_id): Path<String>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<FeedResponse>, AppError> {
    // Single-lane cursor; malformed tokens restart from the first page.
    let after = params.cursor.as_deref().and_then(CursorPos::decode);
    let limit = params
        .limit
        .unwrap_or(state.config.feed.default_page_size)
        .clamp(1, state.config.feed.max_page_size);

    let post_service = PostService::new(state.db.clone());
    let page = post_service
        .posts_of_author(&author_id, after.as_ref(), limit)
        .await?;

    let users = state.db.get_users_by_ids(&[author_id]).await?;
    let posts = page
        .posts
        .iter()
        .map(|post| converters::post_to_response(post, &users))
        .collect();

    Ok(Json(FeedResponse {
        posts,
        next_cursor: page.next_cursor.map(|cursor| cursor.encode()),
    }))
}

//! Friend graph endpoints

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::service::FriendGraphService;

use super::converters;
use super::dto::*;

/// POST /friend-requests
pub async fn create_friend_request(
    State(state): State<AppState>,
    CurrentUser(sender_id): CurrentUser,
    Json(body): Json<CreateFriendRequestRequest>,
) -> Result<(StatusCode, Json<FriendRequestResponse>), AppError> {
    let friend_graph = FriendGraphService::new(state.db.clone());
    let request = friend_graph
        .send_request(&sender_id, &body.recipient_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(converters::friend_request_to_response(&request)),
    ))
}

/// PATCH /friend-requests/:id
pub async fn respond_friend_request(
    State(state): State<AppState>,
    CurrentUser(caller_id): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<RespondFriendRequestRequest>,
) -> Result<Json<FriendRequestResponse>, AppError> {
    let friend_graph = FriendGraphService::new(state.db.clone());
    let request = friend_graph.respond(&caller_id, &id, body.action).await?;

    Ok(Json(converters::friend_request_to_response(&request)))
}

/// GET /friend-requests/pending
pub async fn pending_friend_requests(
    State(state): State<AppState>,
    CurrentUser(caller_id): CurrentUser,
) -> Result<Json<Vec<PendingRequestResponse>>, AppError> {
    let friend_graph = FriendGraphService::new(state.db.clone());
    let requests = friend_graph.pending_for(&caller_id).await?;

    // Attach sender profiles in one query
    let sender_ids: Vec<String> = requests.iter().map(|r| r.sender_id.clone()).collect();
    let users: HashMap<_, _> = state.db.get_users_by_ids(&sender_ids).await?;

    let responses = requests
        .iter()
        .map(|request| PendingRequestResponse {
            request: converters::friend_request_to_response(request),
            sender: users.get(&request.sender_id).map(converters::author_to_response),
        })
        .collect();

    Ok(Json(responses))
}

/// GET /friend-requests/status?user_id=
pub async fn friend_status(
    State(state): State<AppState>,
    CurrentUser(caller_id): CurrentUser,
    Query(params): Query<FriendStatusParams>,
) -> Result<Json<FriendStatusResponse>, AppError> {
    let friend_graph = FriendGraphService::new(state.db.clone());
    let status = friend_graph
        .status_between(&caller_id, &params.user_id)
        .await?;

    Ok(Json(FriendStatusResponse {
        status: status.status,
        request_id: status.request_id,
        is_outgoing: status.is_outgoing,
    }))
}

/// DELETE /friends/:id
pub async fn unfriend(
    State(state): State<AppState>,
    CurrentUser(caller_id): CurrentUser,
    Path(friend_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let friend_graph = FriendGraphService::new(state.db.clone());
    friend_graph.unfriend(&caller_id, &friend_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/:id/friends
pub async fn list_friends(
    State(state): State<AppState>,
    CurrentUser(_caller_id): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<AuthorResponse>>, AppError> {
    let friend_graph = FriendGraphService::new(state.db.clone());
    let friends = friend_graph.friends_of(&user_id).await?;

    Ok(Json(
        friends.iter().map(converters::author_to_response).collect(),
    ))
}

/// GET /users/:id/friends/count
pub async fn friend_count(
    State(state): State<AppState>,
    CurrentUser(_caller_id): CurrentUser,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let friend_graph = FriendGraphService::new(state.db.clone());
    let count = friend_graph.friend_count(&user_id).await?;

    Ok(Json(serde_json::json!({ "count": count })))
}

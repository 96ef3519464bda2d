//! Model → DTO converters

use std::collections::HashMap;

use crate::data::{FriendRequest, Notification, Post, User};

use super::dto::*;

/// Build an author summary from a synced profile.
pub fn author_to_response(user: &User) -> AuthorResponse {
    AuthorResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        profile_picture: user.profile_picture.clone(),
    }
}

/// Author summary for an id whose profile may not be synced yet.
/// Identity is external, so a missing row degrades to the bare id.
pub fn author_or_placeholder(author_id: &str, users: &HashMap<String, User>) -> AuthorResponse {
    match users.get(author_id) {
        Some(user) => author_to_response(user),
        None => AuthorResponse {
            id: author_id.to_string(),
            username: author_id.to_string(),
            first_name: None,
            last_name: None,
            profile_picture: None,
        },
    }
}

pub fn post_to_response(post: &Post, users: &HashMap<String, User>) -> PostResponse {
    PostResponse {
        id: post.id.clone(),
        content: post.content.clone(),
        image_url: post.image_url.clone(),
        tags: post.tags.clone(),
        created_at: post.created_at,
        updated_at: post.updated_at,
        author: author_or_placeholder(&post.author_id, users),
    }
}

pub fn friend_request_to_response(request: &FriendRequest) -> FriendRequestResponse {
    FriendRequestResponse {
        id: request.id.clone(),
        sender_id: request.sender_id.clone(),
        recipient_id: request.recipient_id.clone(),
        status: request.status.clone(),
        created_at: request.created_at,
        updated_at: request.updated_at,
    }
}

pub fn notification_to_response(notification: &Notification) -> NotificationResponse {
    NotificationResponse {
        id: notification.id.clone(),
        notification_type: notification.notification_type.clone(),
        title: notification.title.clone(),
        content: notification.content.clone(),
        related_id: notification.related_id.clone(),
        read: notification.read,
        created_at: notification.created_at,
    }
}

pub fn user_to_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        profile_picture: user.profile_picture.clone(),
        created_at: user.created_at,
        updated_at: user.updated_at,
    }
}

//! API layer
//!
//! HTTP handlers for:
//! - Feed and preferences
//! - Posts
//! - Friend graph
//! - Notifications
//! - Metrics (Prometheus)

mod converters;
mod dto;
mod feed;
mod friends;
pub mod metrics;
mod notifications;
mod posts;
mod tags;
mod users;

pub use converters::*;
pub use dto::*;

pub use metrics::metrics_router;

use axum::{
    Router,
    routing::{delete, get, patch, post},
};

use crate::AppState;

/// Create the API router
///
/// All routes except `/tags` require the gateway-authenticated caller;
/// authentication is enforced by the `CurrentUser` extractor in each
/// handler.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Feed
        .route("/feed", get(feed::get_feed))
        .route("/feed/preferences", get(feed::get_preferences))
        .route("/feed/preferences", post(feed::update_preferences))
        // Posts
        .route("/posts", post(posts::create_post))
        .route("/posts/:id", get(posts::get_post))
        .route("/posts/:id", delete(posts::delete_post))
        // Users
        .route("/users", post(users::sync_user))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id/posts", get(posts::user_posts))
        .route("/users/:id/friends", get(friends::list_friends))
        .route("/users/:id/friends/count", get(friends::friend_count))
        // Friend graph
        .route("/friend-requests", post(friends::create_friend_request))
        .route(
            "/friend-requests/pending",
            get(friends::pending_friend_requests),
        )
        .route("/friend-requests/status", get(friends::friend_status))
        .route("/friend-requests/:id", patch(friends::respond_friend_request))
        .route("/friends/:id", delete(friends::unfriend))
        // Notifications
        .route("/notifications", get(notifications::get_notifications))
        .route(
            "/notifications/unread_count",
            get(notifications::get_unread_count),
        )
        .route(
            "/notifications/:id/read",
            patch(notifications::mark_notification_read),
        )
        // Tags
        .route("/tags", get(tags::list_tags))
        .route("/tags/trending", get(tags::trending_tags))
}

//! API request and response DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::service::FriendRequestAction;

// =============================================================================
// Shared
// =============================================================================

/// Author summary embedded in post responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorResponse {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

/// Cursor/limit query parameters
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

// =============================================================================
// Feed
// =============================================================================

/// Post response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: AuthorResponse,
}

/// Feed page response
#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    pub posts: Vec<PostResponse>,
    /// Opaque token for the next page; null on the last page
    pub next_cursor: Option<String>,
}

/// Feed preferences response
#[derive(Debug, Serialize, Deserialize)]
pub struct PreferencesResponse {
    pub tags: Vec<String>,
    pub backfill: bool,
}

/// Feed preferences update
#[derive(Debug, Deserialize)]
pub struct UpdatePreferencesRequest {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub backfill: bool,
}

// =============================================================================
// Posts
// =============================================================================

/// New post payload
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

// =============================================================================
// Friend graph
// =============================================================================

/// New friend request payload
#[derive(Debug, Deserialize)]
pub struct CreateFriendRequestRequest {
    pub recipient_id: String,
}

/// Response action on a pending friend request
#[derive(Debug, Deserialize)]
pub struct RespondFriendRequestRequest {
    pub action: FriendRequestAction,
}

/// Friend request response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendRequestResponse {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Pending request with the sender's profile attached
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingRequestResponse {
    #[serde(flatten)]
    pub request: FriendRequestResponse,
    pub sender: Option<AuthorResponse>,
}

/// Edge status between the caller and another user
#[derive(Debug, Serialize, Deserialize)]
pub struct FriendStatusResponse {
    /// NONE, PENDING, ACCEPTED or REJECTED
    pub status: String,
    pub request_id: Option<String>,
    pub is_outgoing: Option<bool>,
}

/// Query parameter for the status endpoint
#[derive(Debug, Deserialize)]
pub struct FriendStatusParams {
    pub user_id: String,
}

// =============================================================================
// Users
// =============================================================================

/// Profile sync payload from the identity provider
#[derive(Debug, Deserialize)]
pub struct SyncUserRequest {
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
}

/// User response
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Notifications
// =============================================================================

/// Notification response
#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: String,
    pub title: String,
    pub content: String,
    pub related_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tags
// =============================================================================

/// Trending tag entry
#[derive(Debug, Serialize, Deserialize)]
pub struct TrendingTagResponse {
    pub name: String,
    pub count: i64,
}

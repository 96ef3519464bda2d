//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tag vocabulary
// =============================================================================

/// The fixed, controlled tag vocabulary.
///
/// Post tags and feed preferences must be drawn from this list.
pub const TAG_VOCABULARY: &[&str] = &[
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "Computer Science",
    "Engineering",
    "Medicine",
    "Psychology",
    "Economics",
    "Business",
    "Law",
    "Philosophy",
    "Literature",
    "History",
    "Art",
    "Music",
    "Education",
    "Environmental Science",
    "Political Science",
    "Sociology",
];

/// Whether `tag` belongs to the controlled vocabulary.
pub fn is_valid_tag(tag: &str) -> bool {
    TAG_VOCABULARY.contains(&tag)
}

// =============================================================================
// User
// =============================================================================

/// A user profile, mirrored from the external identity provider.
///
/// The id is externally issued and stable. Feed assembly treats users as
/// read-only input; only the profile sync endpoint writes this table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// URL of an already-uploaded avatar image
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name for notification text: "First Last", falling back to
    /// the username when name fields are absent.
    pub fn display_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.username.clone(),
        }
    }
}

// =============================================================================
// Friend graph
// =============================================================================

/// A friend edge, stored as the request record that created it.
///
/// Sender/recipient asymmetry is preserved for notification routing.
/// Lifecycle: PENDING transitions exactly once to ACCEPTED or REJECTED;
/// ACCEPTED edges may be deleted (unfriend), returning the pair to
/// "no edge", never back to PENDING.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FriendRequest {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: String,
    /// PENDING, ACCEPTED or REJECTED
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendRequest {
    /// The peer of `user_id` on this edge.
    ///
    /// Centralizes the sender/recipient conditional so callers never
    /// re-derive it ad hoc.
    pub fn peer_of(&self, user_id: &str) -> &str {
        if self.sender_id == user_id {
            &self.recipient_id
        } else {
            &self.sender_id
        }
    }
}

/// Friend request status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "ACCEPTED" => Some(Self::Accepted),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }
}

// =============================================================================
// Feed preferences
// =============================================================================

/// Per-user feed personalization.
///
/// Created lazily on first save; a missing row is equivalent to
/// "no tags, backfill disabled".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPreference {
    pub user_id: String,
    /// Chosen tags (deduplicated, subset of [`TAG_VOCABULARY`])
    pub tags: Vec<String>,
    /// Whether non-matching posts may backfill a short page
    pub backfill: bool,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Post
// =============================================================================

/// A post in the feed.
///
/// Owned exclusively by its author. `created_at` plus `id` form the
/// pagination sort key (created_at DESC, id ASC).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub content: String,
    /// URL of an already-uploaded image
    pub image_url: Option<String>,
    /// Tag set, loaded from the post_tags join table
    #[sqlx(skip)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Notifications
// =============================================================================

/// Durable notification record.
///
/// Created only as a side effect of friend-graph mutations; never mutated
/// afterwards except the read flag, which only the recipient may flip.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    /// Type: friend_request, friend_request_accepted
    pub notification_type: String,
    pub title: String,
    pub content: String,
    /// Id of the triggering entity (the friend request)
    pub related_id: Option<String>,
    /// Whether the recipient has seen this
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationType {
    FriendRequest,
    FriendRequestAccepted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FriendRequest => "friend_request",
            Self::FriendRequestAccepted => "friend_request_accepted",
        }
    }
}

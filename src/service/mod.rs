//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services orchestrate database operations; handlers translate
//! between HTTP and service calls.

mod feed;
mod friend_graph;
mod notifications;
mod posts;
mod preferences;

pub use feed::{FeedPage, FeedService};
pub use friend_graph::{FriendGraphService, FriendRequestAction, FriendStatus};
pub use notifications::NotificationService;
pub use posts::{NewPost, PostPage, PostService};
pub use preferences::PreferenceService;

//! Friend graph
//!
//! The single place that resolves "who is the peer" from the
//! sender/recipient asymmetry of request records, plus the request
//! lifecycle itself (send, accept/reject, unfriend).

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::data::{Database, EntityId, FriendRequest, FriendRequestStatus, User};
use crate::error::AppError;
use crate::service::NotificationService;

/// Action a recipient takes on a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestAction {
    Accept,
    Reject,
}

/// Edge status between two users, as seen by the caller
#[derive(Debug, Clone, Serialize)]
pub struct FriendStatus {
    /// NONE, PENDING, ACCEPTED or REJECTED
    pub status: String,
    pub request_id: Option<String>,
    /// Whether the caller initiated the governing request
    pub is_outgoing: Option<bool>,
}

/// Friend graph service
pub struct FriendGraphService {
    db: Arc<Database>,
    notifications: NotificationService,
}

impl FriendGraphService {
    /// Create new friend graph service
    pub fn new(db: Arc<Database>) -> Self {
        let notifications = NotificationService::new(db.clone());
        Self { db, notifications }
    }

    /// Resolve the peer set of a user: everyone with an ACCEPTED edge.
    ///
    /// Fail-open by design: an unknown or stale id yields an empty set,
    /// never an error — feed assembly is read-only and must not hard-fail
    /// on identity drift. The user's own id never appears in the result.
    pub async fn peer_ids_of(&self, user_id: &str) -> Result<HashSet<String>, AppError> {
        let peers = self.db.accepted_peer_ids(user_id).await?;
        Ok(peers.into_iter().collect())
    }

    /// Send a friend request, creating a PENDING edge.
    ///
    /// Refused with Conflict when a PENDING or ACCEPTED edge already
    /// exists between the pair in either direction; a REJECTED edge does
    /// not block a new request.
    pub async fn send_request(
        &self,
        sender_id: &str,
        recipient_id: &str,
    ) -> Result<FriendRequest, AppError> {
        let recipient_id = recipient_id.trim();
        if recipient_id.is_empty() {
            return Err(AppError::Validation(
                "recipient_id is required".to_string(),
            ));
        }
        if recipient_id == sender_id {
            return Err(AppError::Validation(
                "cannot send a friend request to yourself".to_string(),
            ));
        }

        let now = Utc::now();
        let request = FriendRequest {
            id: EntityId::new().0,
            sender_id: sender_id.to_string(),
            recipient_id: recipient_id.to_string(),
            status: FriendRequestStatus::Pending.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        // The partial unique index on the normalized pair is the real
        // guard; a concurrent duplicate surfaces as Conflict here.
        self.db.insert_friend_request(&request).await?;

        tracing::info!(
            request_id = %request.id,
            sender = %request.sender_id,
            recipient = %request.recipient_id,
            "Friend request created"
        );

        self.notifications.on_friend_request_created(&request).await;

        Ok(request)
    }

    /// Accept or reject a pending request. Only the recipient may respond,
    /// and the edge transitions exactly once.
    pub async fn respond(
        &self,
        caller_id: &str,
        request_id: &str,
        action: FriendRequestAction,
    ) -> Result<FriendRequest, AppError> {
        let request = self
            .db
            .get_friend_request(request_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if request.recipient_id != caller_id {
            return Err(AppError::Forbidden);
        }

        let to_status = match action {
            FriendRequestAction::Accept => FriendRequestStatus::Accepted,
            FriendRequestAction::Reject => FriendRequestStatus::Rejected,
        };

        // Guarded transition: the UPDATE only matches a PENDING row, so a
        // second accept/reject — including a concurrent one — loses here.
        let transitioned = self
            .db
            .transition_friend_request(request_id, to_status, Utc::now())
            .await?;

        if !transitioned {
            return Err(AppError::Conflict(
                "friend request was already responded to".to_string(),
            ));
        }

        tracing::info!(
            request_id = %request_id,
            status = to_status.as_str(),
            "Friend request transitioned"
        );

        let updated = self
            .db
            .get_friend_request(request_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if to_status == FriendRequestStatus::Accepted {
            self.notifications.on_friend_request_accepted(&updated).await;
        }

        Ok(updated)
    }

    /// Remove an accepted friendship. The pair returns to "no edge".
    pub async fn unfriend(&self, caller_id: &str, friend_id: &str) -> Result<(), AppError> {
        let removed = self.db.delete_accepted_edge(caller_id, friend_id).await?;
        if !removed {
            return Err(AppError::NotFound);
        }

        tracing::info!(user = %caller_id, friend = %friend_id, "Friendship removed");

        Ok(())
    }

    /// Incoming PENDING requests for the caller, newest first
    pub async fn pending_for(&self, recipient_id: &str) -> Result<Vec<FriendRequest>, AppError> {
        self.db.pending_requests_for(recipient_id).await
    }

    /// Edge status between the caller and another user
    pub async fn status_between(
        &self,
        caller_id: &str,
        other_id: &str,
    ) -> Result<FriendStatus, AppError> {
        let edge = self.db.find_edge_between(caller_id, other_id).await?;

        Ok(match edge {
            None => FriendStatus {
                status: "NONE".to_string(),
                request_id: None,
                is_outgoing: None,
            },
            Some(edge) => FriendStatus {
                status: edge.status.clone(),
                is_outgoing: Some(edge.sender_id == caller_id),
                request_id: Some(edge.id),
            },
        })
    }

    /// Profiles of all accepted friends of a user
    pub async fn friends_of(&self, user_id: &str) -> Result<Vec<User>, AppError> {
        let peer_ids: Vec<String> = self.db.accepted_peer_ids(user_id).await?;
        let mut users: Vec<User> = self
            .db
            .get_users_by_ids(&peer_ids)
            .await?
            .into_values()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));

        Ok(users)
    }

    /// Number of accepted friendships for a user
    pub async fn friend_count(&self, user_id: &str) -> Result<i64, AppError> {
        self.db.count_accepted_edges(user_id).await
    }
}

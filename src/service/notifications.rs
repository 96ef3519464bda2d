//! Notification side effects
//!
//! Creates durable notification records when the friend graph mutates.
//! Delivery transport is out of scope; only the records are owned here.
//!
//! Dispatch is best-effort by contract: the friend-edge transition is the
//! source of truth and is never rolled back when a notification insert
//! fails. Idempotency comes from the edge's single-transition lifecycle —
//! each dispatch hook runs at most once per edge per direction.

use std::sync::Arc;

use chrono::Utc;

use crate::data::{Database, EntityId, FriendRequest, Notification, NotificationType};
use crate::error::AppError;
use crate::metrics::NOTIFICATIONS_CREATED_TOTAL;

/// Notification service
pub struct NotificationService {
    db: Arc<Database>,
}

impl NotificationService {
    /// Create new notification service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Notify the recipient of a newly created friend request.
    ///
    /// Failures are logged and swallowed; the request itself stands.
    pub async fn on_friend_request_created(&self, edge: &FriendRequest) {
        let sender_name = self.sender_display_name(&edge.sender_id).await;
        let notification = Notification {
            id: EntityId::new().0,
            recipient_id: edge.recipient_id.clone(),
            notification_type: NotificationType::FriendRequest.as_str().to_string(),
            title: "New Friend Request".to_string(),
            content: format!("{} sent you a friend request", sender_name),
            related_id: Some(edge.id.clone()),
            read: false,
            created_at: Utc::now(),
        };

        self.dispatch(notification).await;
    }

    /// Notify the original sender that their request was accepted.
    pub async fn on_friend_request_accepted(&self, edge: &FriendRequest) {
        let recipient_name = self.sender_display_name(&edge.recipient_id).await;
        let notification = Notification {
            id: EntityId::new().0,
            recipient_id: edge.sender_id.clone(),
            notification_type: NotificationType::FriendRequestAccepted.as_str().to_string(),
            title: "Friend Request Accepted".to_string(),
            content: format!("{} accepted your friend request", recipient_name),
            related_id: Some(edge.id.clone()),
            read: false,
            created_at: Utc::now(),
        };

        self.dispatch(notification).await;
    }

    async fn dispatch(&self, notification: Notification) {
        let notification_type = notification.notification_type.clone();
        match self.db.insert_notification(&notification).await {
            Ok(()) => {
                NOTIFICATIONS_CREATED_TOTAL
                    .with_label_values(&[notification_type.as_str()])
                    .inc();
            }
            Err(error) => {
                tracing::warn!(
                    %error,
                    notification_type = %notification_type,
                    recipient = %notification.recipient_id,
                    "failed to create notification; edge transition stands"
                );
            }
        }
    }

    /// Display name of the acting user, falling back to the raw id when
    /// the profile was never synced.
    async fn sender_display_name(&self, user_id: &str) -> String {
        match self.db.get_user(user_id).await {
            Ok(Some(user)) => user.display_name(),
            Ok(None) => user_id.to_string(),
            Err(error) => {
                tracing::debug!(%error, "could not load profile for notification text");
                user_id.to_string()
            }
        }
    }

    /// Recent notifications for a recipient, newest first, server-capped.
    pub async fn list_for(
        &self,
        recipient_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, AppError> {
        self.db.notifications_for(recipient_id, limit).await
    }

    /// Mark a notification read. Only the recipient may do this.
    pub async fn mark_read(&self, caller_id: &str, notification_id: &str) -> Result<(), AppError> {
        let notification = self
            .db
            .get_notification(notification_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if notification.recipient_id != caller_id {
            return Err(AppError::Forbidden);
        }

        self.db.mark_notification_read(notification_id).await
    }

    /// Count of unread notifications for a recipient
    pub async fn unread_count(&self, recipient_id: &str) -> Result<i64, AppError> {
        self.db.unread_notification_count(recipient_id).await
    }
}

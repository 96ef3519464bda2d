//! SQLite database operations
//!
//! All database access goes through this module.
//! Uses SQLx with runtime queries; dynamic author/tag sets are built
//! with QueryBuilder.

use chrono::{DateTime, Utc};
use sqlx::{Pool, QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::path::Path;

use super::models::*;
use crate::error::AppError;
use crate::pagination::CursorPos;

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Tag predicate applied to a post query.
///
/// An empty tag set degenerates to `Any` in both directions: matching
/// "any of nothing" is no constraint, and excluding "any of nothing"
/// excludes nothing.
#[derive(Debug, Clone, Copy)]
pub enum TagFilter<'a> {
    /// No tag constraint
    Any,
    /// Post must share at least one tag with the set
    MatchesAny(&'a [String]),
    /// Post must share no tag with the set
    MatchesNone(&'a [String]),
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!("Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert or update a user profile
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, first_name, last_name, profile_picture, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                profile_picture = excluded.profile_picture,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.profile_picture)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a user by id
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get users by id set, keyed by id
    pub async fn get_users_by_ids(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, User>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM users WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let users = builder
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
    }

    // =========================================================================
    // Friend graph
    // =========================================================================

    /// Insert a new friend request.
    ///
    /// The partial unique index on the normalized pair rejects a second
    /// non-REJECTED edge, closing the check-then-insert race between two
    /// concurrent senders.
    pub async fn insert_friend_request(&self, request: &FriendRequest) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO friend_requests (id, sender_id, recipient_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&request.id)
        .bind(&request.sender_id)
        .bind(&request.recipient_id)
        .bind(&request.status)
        .bind(request.created_at)
        .bind(request.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::Conflict("a friend request already exists between these users".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Get a friend request by id
    pub async fn get_friend_request(&self, id: &str) -> Result<Option<FriendRequest>, AppError> {
        let request =
            sqlx::query_as::<_, FriendRequest>("SELECT * FROM friend_requests WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    /// Get the edge governing a pair, in either direction.
    ///
    /// A non-REJECTED edge wins over any REJECTED history; among REJECTED
    /// edges the most recent wins.
    pub async fn find_edge_between(
        &self,
        a: &str,
        b: &str,
    ) -> Result<Option<FriendRequest>, AppError> {
        let edge = sqlx::query_as::<_, FriendRequest>(
            r#"
            SELECT * FROM friend_requests
            WHERE (sender_id = ?1 AND recipient_id = ?2)
               OR (sender_id = ?2 AND recipient_id = ?1)
            ORDER BY (status = 'REJECTED') ASC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_optional(&self.pool)
        .await?;

        Ok(edge)
    }

    /// Transition a PENDING request to `to_status`.
    ///
    /// Guarded at the row level so the transition happens at most once;
    /// returns false when the request was not PENDING anymore (or never
    /// existed).
    pub async fn transition_friend_request(
        &self,
        id: &str,
        to_status: FriendRequestStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE friend_requests SET status = ?, updated_at = ? WHERE id = ? AND status = 'PENDING'",
        )
        .bind(to_status.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ids of all users with an ACCEPTED edge to `user_id`.
    ///
    /// Self-edges, should one ever exist, are excluded here so the feed
    /// author set never double-counts the viewer.
    pub async fn accepted_peer_ids(&self, user_id: &str) -> Result<Vec<String>, AppError> {
        let edges = sqlx::query_as::<_, FriendRequest>(
            r#"
            SELECT * FROM friend_requests
            WHERE status = 'ACCEPTED' AND (sender_id = ?1 OR recipient_id = ?1)
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let peers = edges
            .iter()
            .map(|edge| edge.peer_of(user_id).to_string())
            .filter(|peer| peer != user_id)
            .collect();

        Ok(peers)
    }

    /// Incoming PENDING requests for a recipient, newest first
    pub async fn pending_requests_for(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<FriendRequest>, AppError> {
        let requests = sqlx::query_as::<_, FriendRequest>(
            r#"
            SELECT * FROM friend_requests
            WHERE recipient_id = ? AND status = 'PENDING'
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    /// Delete the ACCEPTED edge between a pair (unfriend).
    ///
    /// Returns false when no such edge exists. The pair returns to
    /// "no edge", never to PENDING.
    pub async fn delete_accepted_edge(&self, a: &str, b: &str) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM friend_requests
            WHERE status = 'ACCEPTED'
              AND ((sender_id = ?1 AND recipient_id = ?2)
                OR (sender_id = ?2 AND recipient_id = ?1))
            "#,
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of accepted friendships for a user
    pub async fn count_accepted_edges(&self, user_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM friend_requests
            WHERE status = 'ACCEPTED' AND (sender_id = ?1 OR recipient_id = ?1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    // =========================================================================
    // Feed preferences
    // =========================================================================

    /// Get a user's feed preference row, if any
    pub async fn get_feed_preference(
        &self,
        user_id: &str,
    ) -> Result<Option<FeedPreference>, AppError> {
        let row = sqlx::query_as::<_, (String, String, bool, DateTime<Utc>)>(
            "SELECT user_id, tags, backfill, updated_at FROM feed_preferences WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some((user_id, tags_json, backfill, updated_at)) = row else {
            return Ok(None);
        };

        let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|e| {
            AppError::Internal(anyhow::anyhow!(
                "corrupt feed_preferences.tags for {}: {}",
                user_id,
                e
            ))
        })?;

        Ok(Some(FeedPreference {
            user_id,
            tags,
            backfill,
            updated_at,
        }))
    }

    /// Insert or update a user's feed preferences
    pub async fn upsert_feed_preference(&self, pref: &FeedPreference) -> Result<(), AppError> {
        let tags_json = serde_json::to_string(&pref.tags)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("serialize preference tags: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO feed_preferences (user_id, tags, backfill, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                tags = excluded.tags,
                backfill = excluded.backfill,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&pref.user_id)
        .bind(&tags_json)
        .bind(pref.backfill)
        .bind(pref.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // =========================================================================
    // Posts
    // =========================================================================

    /// Insert a post together with its tag rows
    pub async fn insert_post(&self, post: &Post) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO posts (id, author_id, content, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.author_id)
        .bind(&post.content)
        .bind(&post.image_url)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await?;

        for tag in &post.tags {
            sqlx::query("INSERT INTO post_tags (post_id, tag) VALUES (?, ?)")
                .bind(&post.id)
                .bind(tag)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Get a post by id, tags attached
    pub async fn get_post(&self, id: &str) -> Result<Option<Post>, AppError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(mut post) = post else {
            return Ok(None);
        };

        self.attach_tags(std::slice::from_mut(&mut post)).await?;

        Ok(Some(post))
    }

    /// Delete a post and its tag rows
    pub async fn delete_post(&self, id: &str) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch a page of posts by an author set, optionally tag-filtered,
    /// ordered `created_at DESC, id ASC`, keyset-positioned after `after`.
    ///
    /// This is the single query surface both feed lanes go through. The
    /// caller controls `limit` (typically `page_size + 1` for has-more
    /// detection) and owns the lane's cursor position.
    pub async fn posts_by_authors(
        &self,
        author_ids: &[String],
        tag_filter: TagFilter<'_>,
        after: Option<&CursorPos>,
        limit: usize,
    ) -> Result<Vec<Post>, AppError> {
        if author_ids.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT p.id, p.author_id, p.content, p.image_url, p.created_at, p.updated_at \
             FROM posts p WHERE p.author_id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in author_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        match tag_filter {
            TagFilter::Any => {}
            TagFilter::MatchesAny(tags) if tags.is_empty() => {}
            TagFilter::MatchesNone(tags) if tags.is_empty() => {}
            TagFilter::MatchesAny(tags) => {
                builder.push(
                    " AND EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag IN (",
                );
                let mut separated = builder.separated(", ");
                for tag in tags {
                    separated.push_bind(tag);
                }
                separated.push_unseparated("))");
            }
            TagFilter::MatchesNone(tags) => {
                builder.push(
                    " AND NOT EXISTS (SELECT 1 FROM post_tags t WHERE t.post_id = p.id AND t.tag IN (",
                );
                let mut separated = builder.separated(", ");
                for tag in tags {
                    separated.push_bind(tag);
                }
                separated.push_unseparated("))");
            }
        }

        // Keyset window: strictly after (created_at DESC, id ASC).
        if let Some(pos) = after {
            builder.push(" AND (p.created_at < ");
            builder.push_bind(pos.created_at);
            builder.push(" OR (p.created_at = ");
            builder.push_bind(pos.created_at);
            builder.push(" AND p.id > ");
            builder.push_bind(pos.id.as_str());
            builder.push("))");
        }

        builder.push(" ORDER BY p.created_at DESC, p.id ASC LIMIT ");
        builder.push_bind(limit as i64);

        let mut posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        self.attach_tags(&mut posts).await?;

        Ok(posts)
    }

    /// Load tag sets for a batch of posts in one query
    async fn attach_tags(&self, posts: &mut [Post]) -> Result<(), AppError> {
        if posts.is_empty() {
            return Ok(());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT post_id, tag FROM post_tags WHERE post_id IN (");
        let mut separated = builder.separated(", ");
        for post in posts.iter() {
            separated.push_bind(post.id.as_str());
        }
        separated.push_unseparated(") ORDER BY tag ASC");

        let rows = builder
            .build_query_as::<(String, String)>()
            .fetch_all(&self.pool)
            .await?;

        let mut by_post: HashMap<String, Vec<String>> = HashMap::new();
        for (post_id, tag) in rows {
            by_post.entry(post_id).or_default().push(tag);
        }

        for post in posts.iter_mut() {
            post.tags = by_post.remove(&post.id).unwrap_or_default();
        }

        Ok(())
    }

    /// Most-used tags across all posts
    pub async fn trending_tags(&self, limit: usize) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT tag, COUNT(*) AS uses FROM post_tags
            GROUP BY tag
            ORDER BY uses DESC, tag ASC
            LIMIT ?
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Insert notification
    pub async fn insert_notification(&self, notification: &Notification) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, recipient_id, notification_type, title, content, related_id, read, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.recipient_id)
        .bind(&notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.content)
        .bind(&notification.related_id)
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Recent notifications for a recipient, newest first
    pub async fn notifications_for(
        &self,
        recipient_id: &str,
        limit: usize,
    ) -> Result<Vec<Notification>, AppError> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = ?
            ORDER BY created_at DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(recipient_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Get a single notification by ID
    pub async fn get_notification(&self, id: &str) -> Result<Option<Notification>, AppError> {
        let notification =
            sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(notification)
    }

    /// Mark notification as read
    pub async fn mark_notification_read(&self, id: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Count of unread notifications for a recipient
    pub async fn unread_notification_count(&self, recipient_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND read = 0",
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

//! Database tests

use super::*;
use crate::error::AppError;
use crate::pagination::CursorPos;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

/// Helper to create a test database
async fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let db = Database::connect(&db_path).await.unwrap();
    (db, temp_dir)
}

fn test_user(id: &str) -> User {
    User {
        id: id.to_string(),
        username: format!("{}_name", id),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        profile_picture: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn test_post(id: &str, author: &str, secs: i64, tags: &[&str]) -> Post {
    let at = Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap();
    Post {
        id: id.to_string(),
        author_id: author.to_string(),
        content: format!("post {}", id),
        image_url: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        created_at: at,
        updated_at: at,
    }
}

fn pending_request(id: &str, sender: &str, recipient: &str) -> FriendRequest {
    FriendRequest {
        id: id.to_string(),
        sender_id: sender.to_string(),
        recipient_id: recipient.to_string(),
        status: FriendRequestStatus::Pending.as_str().to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_database_connection() {
    let (_db, _temp_dir) = create_test_db().await;
    // Connection successful if we get here without panicking
}

#[tokio::test]
async fn test_user_upsert_and_get() {
    let (db, _temp_dir) = create_test_db().await;

    let mut user = test_user("u1");
    db.upsert_user(&user).await.unwrap();

    let retrieved = db.get_user("u1").await.unwrap().unwrap();
    assert_eq!(retrieved.username, "u1_name");

    user.username = "renamed".to_string();
    db.upsert_user(&user).await.unwrap();
    let retrieved = db.get_user("u1").await.unwrap().unwrap();
    assert_eq!(retrieved.username, "renamed");

    assert!(db.get_user("missing").await.unwrap().is_none());
}

#[tokio::test]
async fn test_post_crud() {
    let (db, _temp_dir) = create_test_db().await;

    let post = test_post("p1", "u1", 0, &["Physics", "Mathematics"]);
    db.insert_post(&post).await.unwrap();

    let retrieved = db.get_post("p1").await.unwrap().unwrap();
    assert_eq!(retrieved.content, "post p1");
    assert_eq!(retrieved.tags, vec!["Mathematics", "Physics"]);

    assert!(db.delete_post("p1").await.unwrap());
    assert!(db.get_post("p1").await.unwrap().is_none());
    assert!(!db.delete_post("p1").await.unwrap());

    // Tag rows are deleted with the post
    assert!(db.trending_tags(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_posts_by_authors_tag_filters() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_post(&test_post("p1", "a", 10, &["Physics"]))
        .await
        .unwrap();
    db.insert_post(&test_post("p2", "a", 12, &["Biology"]))
        .await
        .unwrap();
    db.insert_post(&test_post("p3", "b", 11, &[])).await.unwrap();
    db.insert_post(&test_post("p4", "outsider", 13, &["Physics"]))
        .await
        .unwrap();

    let authors = vec!["a".to_string(), "b".to_string()];
    let tags = vec!["Physics".to_string()];

    // Matching lane: only p1 (p4 is outside the author set)
    let matching = db
        .posts_by_authors(&authors, TagFilter::MatchesAny(&tags), None, 10)
        .await
        .unwrap();
    assert_eq!(
        matching.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
        vec!["p1"]
    );

    // Non-matching lane: p2 and untagged p3, newest first
    let non_matching = db
        .posts_by_authors(&authors, TagFilter::MatchesNone(&tags), None, 10)
        .await
        .unwrap();
    assert_eq!(
        non_matching
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>(),
        vec!["p2", "p3"]
    );

    // No filter: everything from the author set
    let all = db
        .posts_by_authors(&authors, TagFilter::Any, None, 10)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    // Empty tag set degenerates to no constraint in both directions
    let empty: Vec<String> = Vec::new();
    let any = db
        .posts_by_authors(&authors, TagFilter::MatchesAny(&empty), None, 10)
        .await
        .unwrap();
    assert_eq!(any.len(), 3);
    let none = db
        .posts_by_authors(&authors, TagFilter::MatchesNone(&empty), None, 10)
        .await
        .unwrap();
    assert_eq!(none.len(), 3);
}

#[tokio::test]
async fn test_posts_keyset_pagination_no_dup_no_omission() {
    let (db, _temp_dir) = create_test_db().await;

    for i in 0..7 {
        db.insert_post(&test_post(&format!("p{}", i), "a", i, &[]))
            .await
            .unwrap();
    }

    let authors = vec!["a".to_string()];
    let mut seen = Vec::new();
    let mut after: Option<CursorPos> = None;

    loop {
        let page = db
            .posts_by_authors(&authors, TagFilter::Any, after.as_ref(), 3)
            .await
            .unwrap();
        if page.is_empty() {
            break;
        }
        after = page.last().map(CursorPos::after);
        seen.extend(page.into_iter().map(|p| p.id));
    }

    // Newest first, each post exactly once
    assert_eq!(seen, vec!["p6", "p5", "p4", "p3", "p2", "p1", "p0"]);
}

#[tokio::test]
async fn test_posts_tie_break_is_deterministic() {
    let (db, _temp_dir) = create_test_db().await;

    // Same creation instant; id ascending breaks the tie
    db.insert_post(&test_post("pB", "a", 5, &[])).await.unwrap();
    db.insert_post(&test_post("pA", "a", 5, &[])).await.unwrap();

    let authors = vec!["a".to_string()];
    for _ in 0..3 {
        let page = db
            .posts_by_authors(&authors, TagFilter::Any, None, 10)
            .await
            .unwrap();
        assert_eq!(
            page.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["pA", "pB"]
        );
    }

    // Splitting the tie across two pages must not skip or repeat
    let first = db
        .posts_by_authors(&authors, TagFilter::Any, None, 1)
        .await
        .unwrap();
    let pos = CursorPos::after(&first[0]);
    let second = db
        .posts_by_authors(&authors, TagFilter::Any, Some(&pos), 1)
        .await
        .unwrap();
    assert_eq!(first[0].id, "pA");
    assert_eq!(second[0].id, "pB");
}

#[tokio::test]
async fn test_friend_request_single_transition() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_friend_request(&pending_request("fr1", "a", "b"))
        .await
        .unwrap();

    // First transition succeeds
    let accepted = db
        .transition_friend_request("fr1", FriendRequestStatus::Accepted, Utc::now())
        .await
        .unwrap();
    assert!(accepted);

    // Second transition of any kind is refused
    let rejected = db
        .transition_friend_request("fr1", FriendRequestStatus::Rejected, Utc::now())
        .await
        .unwrap();
    assert!(!rejected);

    let edge = db.get_friend_request("fr1").await.unwrap().unwrap();
    assert_eq!(edge.status, "ACCEPTED");
}

#[tokio::test]
async fn test_duplicate_open_edge_is_conflict() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_friend_request(&pending_request("fr1", "a", "b"))
        .await
        .unwrap();

    // Same direction
    let err = db
        .insert_friend_request(&pending_request("fr2", "a", "b"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Opposite direction is the same unordered pair
    let err = db
        .insert_friend_request(&pending_request("fr3", "b", "a"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_rejected_edge_does_not_block_new_request() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_friend_request(&pending_request("fr1", "a", "b"))
        .await
        .unwrap();
    db.transition_friend_request("fr1", FriendRequestStatus::Rejected, Utc::now())
        .await
        .unwrap();

    // A fresh request for the same pair is allowed again
    db.insert_friend_request(&pending_request("fr2", "b", "a"))
        .await
        .unwrap();

    // The governing edge is the open one, not the rejected history
    let edge = db.find_edge_between("a", "b").await.unwrap().unwrap();
    assert_eq!(edge.id, "fr2");
    assert_eq!(edge.status, "PENDING");
}

#[tokio::test]
async fn test_accepted_peer_ids() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_friend_request(&pending_request("fr1", "v", "a"))
        .await
        .unwrap();
    db.insert_friend_request(&pending_request("fr2", "b", "v"))
        .await
        .unwrap();
    db.insert_friend_request(&pending_request("fr3", "v", "c"))
        .await
        .unwrap();

    db.transition_friend_request("fr1", FriendRequestStatus::Accepted, Utc::now())
        .await
        .unwrap();
    db.transition_friend_request("fr2", FriendRequestStatus::Accepted, Utc::now())
        .await
        .unwrap();
    // fr3 stays PENDING and must not appear

    let mut peers = db.accepted_peer_ids("v").await.unwrap();
    peers.sort();
    assert_eq!(peers, vec!["a", "b"]);

    // Unknown user resolves fail-open to an empty set
    assert!(db.accepted_peer_ids("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unfriend_removes_edge() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_friend_request(&pending_request("fr1", "a", "b"))
        .await
        .unwrap();
    db.transition_friend_request("fr1", FriendRequestStatus::Accepted, Utc::now())
        .await
        .unwrap();
    assert_eq!(db.count_accepted_edges("a").await.unwrap(), 1);

    // Either orientation removes the edge
    assert!(db.delete_accepted_edge("b", "a").await.unwrap());
    assert_eq!(db.count_accepted_edges("a").await.unwrap(), 0);
    assert!(db.find_edge_between("a", "b").await.unwrap().is_none());

    // Second delete is a no-op
    assert!(!db.delete_accepted_edge("a", "b").await.unwrap());
}

#[tokio::test]
async fn test_feed_preference_roundtrip() {
    let (db, _temp_dir) = create_test_db().await;

    assert!(db.get_feed_preference("u1").await.unwrap().is_none());

    let pref = FeedPreference {
        user_id: "u1".to_string(),
        tags: vec!["Physics".to_string(), "Art".to_string()],
        backfill: true,
        updated_at: Utc::now(),
    };
    db.upsert_feed_preference(&pref).await.unwrap();

    let stored = db.get_feed_preference("u1").await.unwrap().unwrap();
    assert_eq!(stored.tags, vec!["Physics", "Art"]);
    assert!(stored.backfill);

    // Upsert replaces the row
    let pref = FeedPreference {
        user_id: "u1".to_string(),
        tags: vec![],
        backfill: false,
        updated_at: Utc::now(),
    };
    db.upsert_feed_preference(&pref).await.unwrap();
    let stored = db.get_feed_preference("u1").await.unwrap().unwrap();
    assert!(stored.tags.is_empty());
    assert!(!stored.backfill);
}

#[tokio::test]
async fn test_notification_operations() {
    let (db, _temp_dir) = create_test_db().await;

    let notification = Notification {
        id: EntityId::new().0,
        recipient_id: "u1".to_string(),
        notification_type: NotificationType::FriendRequest.as_str().to_string(),
        title: "New Friend Request".to_string(),
        content: "Test User sent you a friend request".to_string(),
        related_id: Some("fr1".to_string()),
        read: false,
        created_at: Utc::now(),
    };
    db.insert_notification(&notification).await.unwrap();

    let listed = db.notifications_for("u1", 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].notification_type, "friend_request");
    assert_eq!(db.unread_notification_count("u1").await.unwrap(), 1);

    // Other recipients see nothing
    assert!(db.notifications_for("u2", 10).await.unwrap().is_empty());

    db.mark_notification_read(&notification.id).await.unwrap();
    assert_eq!(db.unread_notification_count("u1").await.unwrap(), 0);
    let read = db.get_notification(&notification.id).await.unwrap().unwrap();
    assert!(read.read);
}

#[tokio::test]
async fn test_trending_tags() {
    let (db, _temp_dir) = create_test_db().await;

    db.insert_post(&test_post("p1", "a", 1, &["Physics", "Art"]))
        .await
        .unwrap();
    db.insert_post(&test_post("p2", "a", 2, &["Physics"]))
        .await
        .unwrap();
    db.insert_post(&test_post("p3", "b", 3, &["Art", "Physics"]))
        .await
        .unwrap();

    let trending = db.trending_tags(2).await.unwrap();
    assert_eq!(trending[0], ("Physics".to_string(), 3));
    assert_eq!(trending[1], ("Art".to_string(), 2));
}

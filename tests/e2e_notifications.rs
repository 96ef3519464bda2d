//! E2E tests for notification side effects

mod common;

use common::TestServer;
use serde_json::{Value, json};

async fn notifications_of(server: &TestServer, user: &str) -> Vec<Value> {
    let response = server.get_as(user, "/notifications").send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body.as_array().unwrap().clone()
}

#[tokio::test]
async fn test_request_and_accept_each_create_exactly_one_notification() {
    let server = TestServer::new().await;

    let response = server
        .post_as("alice", "/friend-requests", &json!({ "recipient_id": "bob" }))
        .send()
        .await
        .unwrap();
    let request: Value = response.json().await.unwrap();
    let request_id = request["id"].as_str().unwrap();

    // Recipient notified of the request
    let for_bob = notifications_of(&server, "bob").await;
    assert_eq!(for_bob.len(), 1);
    assert_eq!(for_bob[0]["type"], "friend_request");
    assert_eq!(for_bob[0]["related_id"], request_id);
    assert_eq!(for_bob[0]["read"], false);

    server
        .patch_as(
            "bob",
            &format!("/friend-requests/{}", request_id),
            &json!({ "action": "accept" }),
        )
        .send()
        .await
        .unwrap();

    // Sender notified of the acceptance; no extra notification for bob
    let for_alice = notifications_of(&server, "alice").await;
    assert_eq!(for_alice.len(), 1);
    assert_eq!(for_alice[0]["type"], "friend_request_accepted");
    assert_eq!(notifications_of(&server, "bob").await.len(), 1);
}

#[tokio::test]
async fn test_rejection_creates_no_notification() {
    let server = TestServer::new().await;

    let response = server
        .post_as("alice", "/friend-requests", &json!({ "recipient_id": "bob" }))
        .send()
        .await
        .unwrap();
    let request: Value = response.json().await.unwrap();

    server
        .patch_as(
            "bob",
            &format!("/friend-requests/{}", request["id"].as_str().unwrap()),
            &json!({ "action": "reject" }),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(notifications_of(&server, "alice").await.len(), 0);
}

#[tokio::test]
async fn test_notification_text_uses_synced_display_name() {
    let server = TestServer::new().await;

    server
        .post_as(
            "alice",
            "/users",
            &json!({ "username": "alice_w", "first_name": "Alice", "last_name": "Wong" }),
        )
        .send()
        .await
        .unwrap();

    server
        .post_as("alice", "/friend-requests", &json!({ "recipient_id": "bob" }))
        .send()
        .await
        .unwrap();

    let for_bob = notifications_of(&server, "bob").await;
    assert_eq!(
        for_bob[0]["content"],
        "Alice Wong sent you a friend request"
    );
}

#[tokio::test]
async fn test_only_recipient_may_mark_read() {
    let server = TestServer::new().await;

    server
        .post_as("alice", "/friend-requests", &json!({ "recipient_id": "bob" }))
        .send()
        .await
        .unwrap();

    let for_bob = notifications_of(&server, "bob").await;
    let notification_id = for_bob[0]["id"].as_str().unwrap();
    let path = format!("/notifications/{}/read", notification_id);

    // A non-recipient is refused
    let response = server.patch_as("alice", &path, &json!({})).send().await.unwrap();
    assert_eq!(response.status(), 403);

    // Unknown id is 404
    let response = server
        .patch_as("bob", "/notifications/no-such-id/read", &json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // The recipient flips the flag
    let response = server.patch_as("bob", &path, &json!({})).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["read"], true);
}

#[tokio::test]
async fn test_unread_count_tracks_read_flag() {
    let server = TestServer::new().await;

    server
        .post_as("alice", "/friend-requests", &json!({ "recipient_id": "bob" }))
        .send()
        .await
        .unwrap();
    server
        .post_as("carol", "/friend-requests", &json!({ "recipient_id": "bob" }))
        .send()
        .await
        .unwrap();

    let response = server.get_as("bob", "/notifications/unread_count").send().await.unwrap();
    let count: Value = response.json().await.unwrap();
    assert_eq!(count["count"], 2);

    let for_bob = notifications_of(&server, "bob").await;
    let first_id = for_bob[0]["id"].as_str().unwrap();
    server
        .patch_as("bob", &format!("/notifications/{}/read", first_id), &json!({}))
        .send()
        .await
        .unwrap();

    let response = server.get_as("bob", "/notifications/unread_count").send().await.unwrap();
    let count: Value = response.json().await.unwrap();
    assert_eq!(count["count"], 1);
}

//! E2E tests for the friend request lifecycle

mod common;

use common::TestServer;
use serde_json::{Value, json};

async fn send_request(server: &TestServer, sender: &str, recipient: &str) -> (u16, Value) {
    let response = server
        .post_as(sender, "/friend-requests", &json!({ "recipient_id": recipient }))
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    let body = response.json().await.unwrap();
    (status, body)
}

#[tokio::test]
async fn test_request_accept_flow() {
    let server = TestServer::new().await;

    let (status, request) = send_request(&server, "alice", "bob").await;
    assert_eq!(status, 201);
    assert_eq!(request["status"], "PENDING");
    assert_eq!(request["sender_id"], "alice");
    assert_eq!(request["recipient_id"], "bob");

    let response = server
        .patch_as(
            "bob",
            &format!("/friend-requests/{}", request["id"].as_str().unwrap()),
            &json!({ "action": "accept" }),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["status"], "ACCEPTED");

    // Both sides see the friendship
    let response = server.get_as("alice", "/users/alice/friends/count").send().await.unwrap();
    let count: Value = response.json().await.unwrap();
    assert_eq!(count["count"], 1);
}

#[tokio::test]
async fn test_duplicate_request_conflicts_either_direction() {
    let server = TestServer::new().await;

    let (status, _) = send_request(&server, "alice", "bob").await;
    assert_eq!(status, 201);

    let (status, _) = send_request(&server, "alice", "bob").await;
    assert_eq!(status, 409);

    let (status, _) = send_request(&server, "bob", "alice").await;
    assert_eq!(status, 409);
}

#[tokio::test]
async fn test_self_request_is_rejected() {
    let server = TestServer::new().await;

    let (status, _) = send_request(&server, "alice", "alice").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_only_recipient_may_respond() {
    let server = TestServer::new().await;

    let (_, request) = send_request(&server, "alice", "bob").await;
    let path = format!("/friend-requests/{}", request["id"].as_str().unwrap());

    // The sender cannot accept their own request
    let response = server
        .patch_as("alice", &path, &json!({ "action": "accept" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // Unknown id is 404
    let response = server
        .patch_as("bob", "/friend-requests/no-such-id", &json!({ "action": "accept" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_second_transition_conflicts() {
    let server = TestServer::new().await;

    let (_, request) = send_request(&server, "alice", "bob").await;
    let path = format!("/friend-requests/{}", request["id"].as_str().unwrap());

    let response = server
        .patch_as("bob", &path, &json!({ "action": "reject" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Reject-then-accept must fail
    let response = server
        .patch_as("bob", &path, &json!({ "action": "accept" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_rejected_pair_may_try_again() {
    let server = TestServer::new().await;

    let (_, request) = send_request(&server, "alice", "bob").await;
    server
        .patch_as(
            "bob",
            &format!("/friend-requests/{}", request["id"].as_str().unwrap()),
            &json!({ "action": "reject" }),
        )
        .send()
        .await
        .unwrap();

    let (status, fresh) = send_request(&server, "bob", "alice").await;
    assert_eq!(status, 201);
    assert_eq!(fresh["status"], "PENDING");
}

#[tokio::test]
async fn test_pending_listing_includes_sender_profile() {
    let server = TestServer::new().await;

    // Sync alice's profile so the listing can embed it
    server
        .post_as("alice", "/users", &json!({ "username": "alice_w" }))
        .send()
        .await
        .unwrap();

    send_request(&server, "alice", "bob").await;

    let response = server.get_as("bob", "/friend-requests/pending").send().await.unwrap();
    assert_eq!(response.status(), 200);
    let pending: Value = response.json().await.unwrap();
    let items = pending.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["sender_id"], "alice");
    assert_eq!(items[0]["sender"]["username"], "alice_w");

    // The sender's own pending list is empty (incoming only)
    let response = server.get_as("alice", "/friend-requests/pending").send().await.unwrap();
    let pending: Value = response.json().await.unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_status_endpoint_reports_direction() {
    let server = TestServer::new().await;

    let response = server
        .get_as("alice", "/friend-requests/status?user_id=bob")
        .send()
        .await
        .unwrap();
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["status"], "NONE");

    send_request(&server, "alice", "bob").await;

    let response = server
        .get_as("alice", "/friend-requests/status?user_id=bob")
        .send()
        .await
        .unwrap();
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["status"], "PENDING");
    assert_eq!(status["is_outgoing"], true);

    let response = server
        .get_as("bob", "/friend-requests/status?user_id=alice")
        .send()
        .await
        .unwrap();
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["is_outgoing"], false);
}

#[tokio::test]
async fn test_unfriend_removes_the_edge() {
    let server = TestServer::new().await;

    server.befriend("alice", "bob").await;

    let response = server.delete_as("alice", "/friends/bob").send().await.unwrap();
    assert_eq!(response.status(), 204);

    let response = server.get_as("alice", "/users/alice/friends").send().await.unwrap();
    let friends: Value = response.json().await.unwrap();
    assert_eq!(friends.as_array().unwrap().len(), 0);

    // The edge is gone entirely, not pending
    let response = server
        .get_as("alice", "/friend-requests/status?user_id=bob")
        .send()
        .await
        .unwrap();
    let status: Value = response.json().await.unwrap();
    assert_eq!(status["status"], "NONE");

    // Unfriending again is 404
    let response = server.delete_as("alice", "/friends/bob").send().await.unwrap();
    assert_eq!(response.status(), 404);
}

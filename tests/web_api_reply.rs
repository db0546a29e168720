//! Web API Reply Tests
//!
//! Integration tests for the reply tree.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{bearer, create_test_app, error_fields, TestApp};

async fn post_reply(app: &TestApp, token: &str, body: Value) -> i64 {
    let response = app
        .server
        .post("/api/replies")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_reply_to_thread_and_reply() {
    let app = create_test_app().await;
    let (admin, _) = app.user("admin", true).await;
    let (user, token) = app.user("alice", false).await;
    let board = app.board(admin.id, "Random", "b").await;
    let thread = app.thread(user.id, board, "Thread").await;

    let top = post_reply(&app, &token, json!({"text": "top", "thread": thread})).await;
    let nested = post_reply(&app, &token, json!({"text": "nested", "reply": top})).await;

    let body: Value = app
        .server
        .get(&format!("/api/replies/{}", nested))
        .await
        .json();
    assert_eq!(body["data"]["reply"], top);
    assert_eq!(body["data"]["thread"], Value::Null);
    assert_eq!(body["data"]["owner"], user.id);
    assert_eq!(body["data"]["is_deleted"], false);

    let body: Value = app
        .server
        .get(&format!("/api/replies?thread={}", thread))
        .await
        .json();
    let ids: Vec<i64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![top]);

    let body: Value = app
        .server
        .get(&format!("/api/replies?reply={}", top))
        .await
        .json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reply_must_reference_exactly_one_target() {
    let app = create_test_app().await;
    let (admin, _) = app.user("admin", true).await;
    let (user, token) = app.user("alice", false).await;
    let board = app.board(admin.id, "Random", "b").await;
    let thread = app.thread(user.id, board, "Thread").await;
    let top = post_reply(&app, &token, json!({"text": "top", "thread": thread})).await;

    for payload in [
        json!({"text": "orphan"}),
        json!({"text": "both", "thread": thread, "reply": top}),
    ] {
        let response = app
            .server
            .post("/api/replies")
            .add_header(AUTHORIZATION, bearer(&token))
            .json(&payload)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(error_fields(&body), vec!["non_field_errors"], "{payload}");
    }

    let response = app
        .server
        .post("/api/replies")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({"text": "ghost", "reply": 9999}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&response.json()), vec!["reply"]);
}

#[tokio::test]
async fn test_anonymous_cannot_reply() {
    let app = create_test_app().await;
    let (admin, _) = app.user("admin", true).await;
    let board = app.board(admin.id, "Random", "b").await;
    let thread = app.thread(admin.id, board, "Thread").await;

    app.server
        .post("/api/replies")
        .json(&json!({"text": "hi", "thread": thread}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reply_tree_cascade_delete() {
    let app = create_test_app().await;
    let (admin, _) = app.user("admin", true).await;
    let (user, token) = app.user("alice", false).await;
    let board = app.board(admin.id, "Random", "b").await;
    let thread = app.thread(user.id, board, "Thread").await;

    let root = post_reply(&app, &token, json!({"text": "root", "thread": thread})).await;
    let child = post_reply(&app, &token, json!({"text": "child", "reply": root})).await;
    let grandchild = post_reply(&app, &token, json!({"text": "deep", "reply": child})).await;
    let sibling = post_reply(&app, &token, json!({"text": "sibling", "thread": thread})).await;

    app.server
        .delete(&format!("/api/replies/{}", root))
        .add_header(AUTHORIZATION, bearer(&token))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    for gone in [root, child, grandchild] {
        app.server
            .get(&format!("/api/replies/{}", gone))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
    app.server
        .get(&format!("/api/replies/{}", sibling))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_reply_update_owner_only() {
    let app = create_test_app().await;
    let (admin, _) = app.user("admin", true).await;
    let (alice, alice_token) = app.user("alice", false).await;
    let (_, bob_token) = app.user("bob", false).await;
    let board = app.board(admin.id, "Random", "b").await;
    let thread = app.thread(alice.id, board, "Thread").await;
    let reply = post_reply(&app, &alice_token, json!({"text": "mine", "thread": thread})).await;

    app.server
        .patch(&format!("/api/replies/{}", reply))
        .add_header(AUTHORIZATION, bearer(&bob_token))
        .json(&json!({"text": "stolen"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&format!("/api/replies/{}", reply))
        .add_header(AUTHORIZATION, bearer(&alice_token))
        .json(&json!({"text": "edited"}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["text"], "edited");
    assert_eq!(body["data"]["is_edited"], true);
    assert_eq!(body["data"]["thread"], thread);

    app.server
        .delete(&format!("/api/replies/{}", reply))
        .add_header(AUTHORIZATION, bearer(&bob_token))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

//! Web API Thread Tests
//!
//! Integration tests for thread endpoints and thread voting.

mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{json, Value};

use common::{bearer, create_test_app, error_fields, TestApp};

struct Forum {
    app: TestApp,
    board: i64,
    alice: (i64, String),
    bob: (i64, String),
}

async fn setup_forum() -> Forum {
    let app = create_test_app().await;
    let (admin, _) = app.user("admin", true).await;
    let board = app.board(admin.id, "Random", "b").await;
    let (alice, alice_token) = app.user("alice", false).await;
    let (bob, bob_token) = app.user("bob", false).await;
    Forum {
        app,
        board,
        alice: (alice.id, alice_token),
        bob: (bob.id, bob_token),
    }
}

async fn get_thread(app: &TestApp, id: i64) -> Value {
    let response = app.server.get(&format!("/api/threads/{}", id)).await;
    response.assert_status_ok();
    response.json::<Value>()["data"].clone()
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn test_create_thread() {
    let f = setup_forum().await;

    let response = f
        .app
        .server
        .post("/api/threads")
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .json(&json!({"board": f.board, "title": "Hello", "content": "First post"}))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["data"]["owner"], f.alice.0);
    assert_eq!(body["data"]["board"], f.board);
    assert_eq!(body["data"]["is_edited"], false);
    assert_eq!(body["data"]["image"], Value::Null);
    assert_eq!(body["data"]["upvotes"], json!([]));
}

#[tokio::test]
async fn test_create_thread_requires_auth() {
    let f = setup_forum().await;

    let response = f
        .app
        .server
        .post("/api/threads")
        .json(&json!({"board": f.board, "title": "Hello", "content": "Body"}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_thread_validation() {
    let f = setup_forum().await;

    let response = f
        .app
        .server
        .post("/api/threads")
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .json(&json!({"board": 9999, "title": "   "}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let mut fields = error_fields(&body);
    fields.sort();
    assert_eq!(fields, vec!["board", "content", "title"]);
    assert_eq!(
        body["error"]["details"]["board"][0],
        "Invalid pk \"9999\" - object does not exist."
    );
}

#[tokio::test]
async fn test_create_thread_with_image_is_not_edited() {
    let f = setup_forum().await;

    let form = MultipartForm::new()
        .add_text("board", f.board.to_string())
        .add_text("title", "Look")
        .add_text("content", "A picture")
        .add_part(
            "image",
            Part::bytes(b"\x89PNG\r\n\x1a\nfake".to_vec())
                .file_name("look.png")
                .mime_type("image/png"),
        );
    let response = f
        .app
        .server
        .post("/api/threads")
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    let image = body["data"]["image"].as_str().unwrap().to_string();
    assert!(image.starts_with("uploads/thread/"));
    assert_eq!(body["data"]["is_edited"], false);
    assert_eq!(body["data"]["board"], f.board);
    assert!(f.app.media.path().join(&image).is_file());

    let thread = body["data"]["id"].as_i64().unwrap();
    let stored = get_thread(&f.app, thread).await;
    assert_eq!(stored["image"], image.as_str());
    assert_eq!(stored["is_edited"], false);
}

#[tokio::test]
async fn test_create_thread_form_validation_discards_image() {
    let f = setup_forum().await;

    let form = MultipartForm::new()
        .add_text("board", "9999")
        .add_text("title", "Look")
        .add_text("content", "A picture")
        .add_part(
            "image",
            Part::bytes(b"GIF89a".to_vec())
                .file_name("look.gif")
                .mime_type("image/gif"),
        );
    let response = f
        .app
        .server
        .post("/api/threads")
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .multipart(form)
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_fields(&response.json()), vec!["board"]);

    let leftovers = std::fs::read_dir(f.app.media.path().join("uploads/thread"))
        .unwrap()
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_create_thread_bad_board_type_is_field_error() {
    let f = setup_forum().await;

    let response = f
        .app
        .server
        .post("/api/threads")
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .json(&json!({"board": "abc", "title": "Hello", "content": "Body"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(error_fields(&body), vec!["board"]);
    assert_eq!(
        body["error"]["details"]["board"][0],
        "Incorrect type. Expected pk value, received abc."
    );
}

#[tokio::test]
async fn test_patch_title_keeps_content_and_image() {
    let f = setup_forum().await;

    let form = MultipartForm::new()
        .add_text("board", f.board.to_string())
        .add_text("title", "Before")
        .add_text("content", "Body stays")
        .add_part(
            "image",
            Part::bytes(b"jpeg bytes".to_vec())
                .file_name("photo.jpg")
                .mime_type("image/jpeg"),
        );
    let created: Value = f
        .app
        .server
        .post("/api/threads")
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .multipart(form)
        .await
        .json();
    let thread = created["data"]["id"].as_i64().unwrap();
    let image = created["data"]["image"].clone();
    assert!(image.is_string());

    let response = f
        .app
        .server
        .patch(&format!("/api/threads/{}", thread))
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .json(&json!({"title": "After"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "After");
    assert_eq!(body["data"]["content"], "Body stays");
    assert_eq!(body["data"]["image"], image);
    assert_eq!(body["data"]["is_edited"], true);
}

#[tokio::test]
async fn test_owner_patch_is_sparse_and_marks_edited() {
    let f = setup_forum().await;
    let thread = f.app.thread(f.alice.0, f.board, "Original").await;

    let response = f
        .app
        .server
        .patch(&format!("/api/threads/{}", thread))
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .json(&json!({"content": "Rewritten"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["title"], "Original");
    assert_eq!(body["data"]["content"], "Rewritten");
    assert_eq!(body["data"]["is_edited"], true);
}

#[tokio::test]
async fn test_cross_user_patch_is_forbidden_and_leaves_fields() {
    let f = setup_forum().await;
    let thread = f.app.thread(f.alice.0, f.board, "Original").await;

    let response = f
        .app
        .server
        .patch(&format!("/api/threads/{}", thread))
        .add_header(AUTHORIZATION, bearer(&f.bob.1))
        .json(&json!({"title": "Hijacked", "content": "Hijacked"}))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    let stored = get_thread(&f.app, thread).await;
    assert_eq!(stored["title"], "Original");
    assert_eq!(stored["content"], "content");
    assert_eq!(stored["is_edited"], false);
}

#[tokio::test]
async fn test_anonymous_delete_is_unauthorized() {
    let f = setup_forum().await;
    let thread = f.app.thread(f.alice.0, f.board, "Keep me").await;

    f.app
        .server
        .delete(&format!("/api/threads/{}", thread))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    f.app
        .server
        .delete(&format!("/api/threads/{}", thread))
        .add_header(AUTHORIZATION, bearer(&f.bob.1))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    get_thread(&f.app, thread).await;
}

#[tokio::test]
async fn test_owner_delete_cascades_replies_and_votes() {
    let f = setup_forum().await;
    let thread = f.app.thread(f.alice.0, f.board, "Doomed").await;

    let reply: Value = f
        .app
        .server
        .post("/api/replies")
        .add_header(AUTHORIZATION, bearer(&f.bob.1))
        .json(&json!({"text": "first", "thread": thread}))
        .await
        .json();
    let reply_id = reply["data"]["id"].as_i64().unwrap();

    f.app
        .server
        .post(&format!("/api/threads/{}/upvote-thread", thread))
        .add_header(AUTHORIZATION, bearer(&f.bob.1))
        .json(&json!({"thread": thread}))
        .await
        .assert_status_ok();

    f.app
        .server
        .delete(&format!("/api/threads/{}", thread))
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    f.app
        .server
        .get(&format!("/api/threads/{}", thread))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    f.app
        .server
        .get(&format!("/api/replies/{}", reply_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let (upvotes,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM upvotes")
        .fetch_one(f.app.db.pool())
        .await
        .unwrap();
    assert_eq!(upvotes, 0);
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_threads_board_filter() {
    let f = setup_forum().await;
    let (admin, _) = f.app.user("admin2", true).await;
    let other_board = f.app.board(admin.id, "Technology", "g").await;
    let third_board = f.app.board(admin.id, "Music", "mu").await;

    f.app.thread(f.alice.0, f.board, "In b").await;
    f.app.thread(f.alice.0, other_board, "In g").await;
    f.app.thread(f.alice.0, third_board, "In mu").await;

    let body: Value = f.app.server.get("/api/threads").await.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let response = f
        .app
        .server
        .get(&format!("/api/threads?board={},{}", f.board, other_board))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    let mut titles: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["In b", "In g"]);

    f.app
        .server
        .get("/api/threads?board=abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// ============================================================================
// Voting
// ============================================================================

#[tokio::test]
async fn test_cross_user_upvote_then_cancel() {
    let f = setup_forum().await;
    let thread = f.app.thread(f.alice.0, f.board, "Vote on me").await;
    let url = format!("/api/threads/{}/upvote-thread", thread);

    let response = f
        .app
        .server
        .post(&url)
        .add_header(AUTHORIZATION, bearer(&f.bob.1))
        .json(&json!({"thread": thread}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "You've done upvoting the thread!");
    assert!(body.get("data").is_none());
    assert_eq!(get_thread(&f.app, thread).await["upvotes"], json!([f.bob.0]));

    let response = f
        .app
        .server
        .post(&url)
        .add_header(AUTHORIZATION, bearer(&f.bob.1))
        .json(&json!({"thread": thread}))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);
    assert_eq!(get_thread(&f.app, thread).await["upvotes"], json!([]));
}

#[tokio::test]
async fn test_own_upvote_swaps_to_downvote() {
    let f = setup_forum().await;
    let thread = f.app.thread(f.alice.0, f.board, "Self vote").await;

    f.app
        .server
        .post(&format!("/api/threads/{}/upvote-thread", thread))
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .json(&json!({"thread": thread}))
        .await
        .assert_status_ok();

    let response = f
        .app
        .server
        .post(&format!("/api/threads/{}/downvote-thread", thread))
        .add_header(AUTHORIZATION, bearer(&f.alice.1))
        .json(&json!({"thread": thread}))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "You've done downvoting the thread!");

    let stored = get_thread(&f.app, thread).await;
    assert_eq!(stored["upvotes"], json!([]));
    assert_eq!(stored["downvotes"], json!([f.alice.0]));
}

#[tokio::test]
async fn test_vote_payload_validation() {
    let f = setup_forum().await;
    let thread = f.app.thread(f.alice.0, f.board, "Strict").await;
    let other = f.app.thread(f.alice.0, f.board, "Other").await;
    let url = format!("/api/threads/{}/upvote-thread", thread);

    for payload in [
        json!({}),
        json!({"thread": "abc"}),
        json!({"thread": 9999}),
        json!({"thread": other}),
    ] {
        let response = f
            .app
            .server
            .post(&url)
            .add_header(AUTHORIZATION, bearer(&f.bob.1))
            .json(&payload)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(error_fields(&body), vec!["thread"], "{payload}");
    }

    let stored = get_thread(&f.app, thread).await;
    assert_eq!(stored["upvotes"], json!([]));
    assert_eq!(get_thread(&f.app, other).await["upvotes"], json!([]));
}

#[tokio::test]
async fn test_vote_on_missing_thread() {
    let f = setup_forum().await;

    f.app
        .server
        .post("/api/threads/9999/downvote-thread")
        .add_header(AUTHORIZATION, bearer(&f.bob.1))
        .json(&json!({"thread": 9999}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_vote_is_unauthorized() {
    let f = setup_forum().await;
    let thread = f.app.thread(f.alice.0, f.board, "Anon").await;

    f.app
        .server
        .post(&format!("/api/threads/{}/upvote-thread", thread))
        .json(&json!({"thread": thread}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

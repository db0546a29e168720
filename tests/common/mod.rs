//! Test helpers for web API integration tests.
//!
//! Builds a router over an in-memory database and a temporary media root,
//! and mints access tokens for users created directly in the database.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::Value;
use tempfile::TempDir;

use sixchan::board::{BoardRepository, NewBoard, NewThread, ThreadRepository};
use sixchan::db::{NewUser, User, UserRepository};
use sixchan::media::ImageStorage;
use sixchan::web::handlers::AppState;
use sixchan::web::middleware::JwtState;
use sixchan::web::router::{create_health_router, create_router};
use sixchan::Database;

pub const JWT_SECRET: &str = "test-secret-key-for-testing-only";

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub state: Arc<AppState>,
    /// Keeps the media root alive for the duration of the test.
    pub media: TempDir,
}

/// Create a test server with an in-memory database.
pub async fn create_test_app() -> TestApp {
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let media = TempDir::new().expect("Failed to create media dir");
    let storage = ImageStorage::new(media.path()).expect("Failed to create image storage");

    let state = Arc::new(AppState::new(db.clone(), JWT_SECRET, 900, storage, 1));
    let jwt_state = Arc::new(JwtState::new(JWT_SECRET));

    let router = create_router(state.clone(), jwt_state, &[]).merge(create_health_router());
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        state,
        media,
    }
}

impl TestApp {
    /// Create a user directly in the database and return it with a token.
    pub async fn user(&self, username: &str, is_admin: bool) -> (User, String) {
        let user = UserRepository::new(self.db.pool())
            .create(
                &NewUser::new(
                    username,
                    format!("{username}@example.com"),
                    "not-a-real-hash",
                )
                .with_admin(is_admin),
            )
            .await
            .expect("Failed to create user");
        let token = self
            .state
            .generate_access_token(&user)
            .expect("Failed to create token");
        (user, token)
    }

    /// Create a board owned by `owner_id` directly in the database.
    pub async fn board(&self, owner_id: i64, name: &str, code: &str) -> i64 {
        BoardRepository::new(self.db.pool())
            .create(&NewBoard::new(owner_id, name, code))
            .await
            .expect("Failed to create board")
            .id
    }

    /// Create a thread directly in the database.
    pub async fn thread(&self, owner_id: i64, board_id: i64, title: &str) -> i64 {
        ThreadRepository::new(self.db.pool())
            .create(&NewThread::new(owner_id, board_id, title, "content"))
            .await
            .expect("Failed to create thread")
            .id
    }
}

/// Authorization header value for a token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Field names present in an error response's details.
pub fn error_fields(body: &Value) -> Vec<String> {
    body["error"]["details"]
        .as_object()
        .map(|details| details.keys().cloned().collect())
        .unwrap_or_default()
}

//! Response DTOs for the web API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::board::{Board, Reply, Thread};
use crate::db::User;

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Plain message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ============================================================================
// Auth
// ============================================================================

/// Login response.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Always `Bearer`.
    pub token_type: &'static str,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Public view of a user account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

// ============================================================================
// Boards, threads, replies
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub id: i64,
    pub owner: i64,
    pub name: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}

impl From<Board> for BoardResponse {
    fn from(board: Board) -> Self {
        Self {
            id: board.id,
            owner: board.owner_id,
            name: board.name,
            code: board.code,
            created_at: board.created_at,
        }
    }
}

/// Thread with the ids of the users currently voting on it.
#[derive(Debug, Serialize)]
pub struct ThreadResponse {
    pub id: i64,
    pub owner: i64,
    pub board: i64,
    pub title: String,
    pub content: String,
    /// Stored path relative to the media root, served under `/api/`.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub is_edited: bool,
    pub upvotes: Vec<i64>,
    pub downvotes: Vec<i64>,
}

impl ThreadResponse {
    pub fn new(thread: Thread, upvotes: Vec<i64>, downvotes: Vec<i64>) -> Self {
        Self {
            id: thread.id,
            owner: thread.owner_id,
            board: thread.board_id,
            title: thread.title,
            content: thread.content,
            image: thread.image,
            created_at: thread.created_at,
            is_edited: thread.is_edited,
            upvotes,
            downvotes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    pub id: i64,
    pub owner: i64,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub thread: Option<i64>,
    pub reply: Option<i64>,
    pub is_edited: bool,
    pub is_deleted: bool,
}

impl From<Reply> for ReplyResponse {
    fn from(reply: Reply) -> Self {
        Self {
            id: reply.id,
            owner: reply.owner_id,
            text: reply.text,
            image: reply.image,
            created_at: reply.created_at,
            thread: reply.thread_id,
            reply: reply.reply_id,
            is_edited: reply.is_edited,
            is_deleted: reply.is_deleted,
        }
    }
}

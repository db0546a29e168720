//! Request DTOs for the web API.
//!
//! Resource fields are optional so that PATCH bodies can leave them out;
//! required-ness and length limits are checked by the board service with
//! field-level messages.

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use super::validation::{no_control_chars, optional_pk};
use crate::board::{BoardInput, ReplyFilter, ReplyInput, ThreadFilter, ThreadInput};
use crate::web::error::ApiError;

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "no_control_chars"))]
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Board create/update body.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct BoardRequest {
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub code: Option<String>,
}

impl From<BoardRequest> for BoardInput {
    fn from(req: BoardRequest) -> Self {
        BoardInput {
            name: req.name,
            code: req.code,
        }
    }
}

/// Thread create/update body.
///
/// `board` is only read on create. It is kept loosely typed so that form
/// fields and malformed ids get a field-level error.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ThreadRequest {
    #[serde(default)]
    pub board: Option<Value>,
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub content: Option<String>,
}

impl ThreadRequest {
    /// Build the create input. The image is attached once stored.
    pub fn into_input(self) -> Result<ThreadInput, ApiError> {
        Ok(ThreadInput {
            board: optional_pk(self.board.as_ref(), "board")?,
            title: self.title,
            content: self.content,
            image: None,
        })
    }
}

/// Reply create/update body.
///
/// `thread` and `reply` are only read on create.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ReplyRequest {
    #[serde(default)]
    #[validate(custom(function = "no_control_chars"))]
    pub text: Option<String>,
    #[serde(default)]
    pub thread: Option<Value>,
    #[serde(default)]
    pub reply: Option<Value>,
}

impl ReplyRequest {
    /// Build the create input. The image is attached once stored.
    pub fn into_input(self) -> Result<ReplyInput, ApiError> {
        Ok(ReplyInput {
            text: self.text,
            thread: optional_pk(self.thread.as_ref(), "thread")?,
            reply: optional_pk(self.reply.as_ref(), "reply")?,
            image: None,
        })
    }
}

/// `GET /threads` query.
#[derive(Debug, Default, Deserialize)]
pub struct ThreadListQuery {
    /// Comma-separated board ids.
    #[serde(default)]
    pub board: Option<String>,
}

impl ThreadListQuery {
    /// Parse the `board` list into a filter. Empty entries are skipped.
    pub fn filter(&self) -> Result<ThreadFilter, ApiError> {
        let Some(ref raw) = self.board else {
            return Ok(ThreadFilter::all());
        };
        let boards = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i64>()
                    .map_err(|_| ApiError::field("board", format!("\"{s}\" is not a valid board id.")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ThreadFilter::boards(boards))
    }
}

/// `GET /replies` query.
#[derive(Debug, Default, Deserialize)]
pub struct ReplyListQuery {
    #[serde(default)]
    pub thread: Option<i64>,
    #[serde(default)]
    pub reply: Option<i64>,
}

impl From<ReplyListQuery> for ReplyFilter {
    fn from(query: ReplyListQuery) -> Self {
        ReplyFilter {
            thread: query.thread,
            reply: query.reply,
        }
    }
}

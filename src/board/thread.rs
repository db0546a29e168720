//! Thread model for sixchan.

use chrono::{DateTime, Utc};

/// Maximum thread title length (in characters).
pub const MAX_TITLE_LENGTH: usize = 255;

/// Thread entity representing a discussion thread in a board.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Thread {
    /// Unique thread ID.
    pub id: i64,
    /// ID of the user who created the thread.
    pub owner_id: i64,
    /// ID of the board this thread belongs to. Never changes.
    pub board_id: i64,
    /// Thread title.
    pub title: String,
    /// Thread body.
    pub content: String,
    /// Stored image path relative to the media root.
    pub image: Option<String>,
    /// Thread creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set on the first successful update, never cleared.
    pub is_edited: bool,
}

/// Data for creating a new thread.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub owner_id: i64,
    pub board_id: i64,
    pub title: String,
    pub content: String,
    /// Stored image path, when posted with an image.
    pub image: Option<String>,
}

impl NewThread {
    /// Create a new thread with required fields.
    pub fn new(
        owner_id: i64,
        board_id: i64,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            owner_id,
            board_id,
            title: title.into(),
            content: content.into(),
            image: None,
        }
    }

    /// Post the thread with an already stored image.
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }
}

/// Data for updating an existing thread.
///
/// Blank values are treated as absent, so an update never clears a field.
#[derive(Debug, Clone, Default)]
pub struct ThreadUpdate {
    /// New title.
    pub title: Option<String>,
    /// New content.
    pub content: Option<String>,
}

impl ThreadUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an update from optional input fields, dropping blank ones.
    pub fn sparse(title: Option<String>, content: Option<String>) -> Self {
        Self {
            title: non_blank(title),
            content: non_blank(content),
        }
    }

    /// Set new title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = non_blank(Some(title.into()));
        self
    }

    /// Set new content.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = non_blank(Some(content.into()));
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

/// Thread listing filter.
#[derive(Debug, Clone, Default)]
pub struct ThreadFilter {
    /// Restrict to threads in any of these boards; empty means all boards.
    pub boards: Vec<i64>,
}

impl ThreadFilter {
    /// No filtering.
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to the given boards.
    pub fn boards(boards: impl Into<Vec<i64>>) -> Self {
        Self {
            boards: boards.into(),
        }
    }
}

pub(super) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

//! Board model for sixchan.

use chrono::{DateTime, Utc};

/// Maximum board name length (in characters).
pub const MAX_BOARD_NAME_LENGTH: usize = 255;

/// Maximum board code length (in characters).
pub const MAX_BOARD_CODE_LENGTH: usize = 4;

/// Board entity: a named category that threads are posted under.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Board {
    /// Unique board ID.
    pub id: i64,
    /// Administrator who created the board.
    pub owner_id: i64,
    /// Board name (unique).
    pub name: String,
    /// Short board code such as `b` or `tech` (unique).
    pub code: String,
    /// Board creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Data for creating a new board.
#[derive(Debug, Clone)]
pub struct NewBoard {
    pub owner_id: i64,
    pub name: String,
    pub code: String,
}

impl NewBoard {
    /// Create a new board.
    pub fn new(owner_id: i64, name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            owner_id,
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Data for updating an existing board.
#[derive(Debug, Clone, Default)]
pub struct BoardUpdate {
    /// New name.
    pub name: Option<String>,
    /// New code.
    pub code: Option<String>,
}

impl BoardUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set new code.
    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Check if the update is empty.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.code.is_none()
    }
}

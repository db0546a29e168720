//! Reply model for sixchan.
//!
//! Replies form a tree rooted at a thread: each reply hangs off either the
//! thread itself or another reply.

use chrono::{DateTime, Utc};

use super::thread::non_blank;

/// Where a reply is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachTarget {
    /// Directly under a thread.
    Thread(i64),
    /// Under another reply.
    Reply(i64),
}

impl AttachTarget {
    /// Build a target from the two optional references.
    ///
    /// Returns `None` unless exactly one of them is set.
    pub fn from_refs(thread: Option<i64>, reply: Option<i64>) -> Option<Self> {
        match (thread, reply) {
            (Some(id), None) => Some(AttachTarget::Thread(id)),
            (None, Some(id)) => Some(AttachTarget::Reply(id)),
            _ => None,
        }
    }

    /// Thread ID if attached directly to a thread.
    pub fn thread_id(&self) -> Option<i64> {
        match self {
            AttachTarget::Thread(id) => Some(*id),
            AttachTarget::Reply(_) => None,
        }
    }

    /// Parent reply ID if attached to another reply.
    pub fn reply_id(&self) -> Option<i64> {
        match self {
            AttachTarget::Thread(_) => None,
            AttachTarget::Reply(id) => Some(*id),
        }
    }
}

/// Reply entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Reply {
    /// Unique reply ID.
    pub id: i64,
    /// ID of the user who wrote the reply.
    pub owner_id: i64,
    /// Reply body.
    pub text: String,
    /// Stored image path relative to the media root.
    pub image: Option<String>,
    /// Reply creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Thread this reply is attached to, if attached directly.
    pub thread_id: Option<i64>,
    /// Parent reply, if attached to another reply.
    pub reply_id: Option<i64>,
    /// Set on the first successful update, never cleared.
    pub is_edited: bool,
    /// Stored and exposed, but not used to hide anything.
    pub is_deleted: bool,
}

impl Reply {
    /// The attachment point of this reply.
    ///
    /// The store guarantees exactly one reference is set.
    pub fn target(&self) -> Option<AttachTarget> {
        AttachTarget::from_refs(self.thread_id, self.reply_id)
    }
}

/// Data for creating a new reply.
#[derive(Debug, Clone)]
pub struct NewReply {
    pub owner_id: i64,
    pub text: String,
    pub target: AttachTarget,
    /// Stored image path, when posted with an image.
    pub image: Option<String>,
}

impl NewReply {
    /// Create a new reply.
    pub fn new(owner_id: i64, text: impl Into<String>, target: AttachTarget) -> Self {
        Self {
            owner_id,
            text: text.into(),
            target,
            image: None,
        }
    }

    /// Post the reply with an already stored image.
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }
}

/// Data for updating an existing reply.
///
/// Blank text is treated as absent. The attachment cannot be changed.
#[derive(Debug, Clone, Default)]
pub struct ReplyUpdate {
    /// New text.
    pub text: Option<String>,
}

impl ReplyUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an update from optional input, dropping blank text.
    pub fn sparse(text: Option<String>) -> Self {
        Self {
            text: non_blank(text),
        }
    }

    /// Set new text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = non_blank(Some(text.into()));
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
    }
}

/// Reply listing filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyFilter {
    /// Only replies attached directly to this thread.
    pub thread: Option<i64>,
    /// Only replies attached to this reply.
    pub reply: Option<i64>,
}

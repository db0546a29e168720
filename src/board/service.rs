//! Board service for sixchan.
//!
//! High-level operations on boards, threads, replies and votes. Every write
//! goes through the access policy first, then input validation, then the
//! repositories.

use tracing::info;

use crate::auth::{permit, Action, Identity, Target};
use crate::db::Database;
use crate::{ChanError, FieldErrors, Result};

use super::cascade::Removed;
use super::reply::{AttachTarget, NewReply, Reply, ReplyFilter, ReplyUpdate};
use super::reply_repository::ReplyRepository;
use super::repository::{already_exists, BoardRepository};
use super::thread::{NewThread, Thread, ThreadFilter, ThreadUpdate, MAX_TITLE_LENGTH};
use super::thread_repository::ThreadRepository;
use super::types::{Board, BoardUpdate, NewBoard, MAX_BOARD_CODE_LENGTH, MAX_BOARD_NAME_LENGTH};
use super::vote::{VoteKind, VoteOutcome};
use super::vote_repository::VoteLedger;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

/// Error message for a reference to a missing row.
pub fn invalid_pk(id: i64) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

/// Check a required text field, recording problems in `errors`.
fn require_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: Option<usize>) {
    match value {
        None => errors.add(field, REQUIRED),
        Some(v) if v.trim().is_empty() => errors.add(field, BLANK),
        Some(v) => {
            if let Some(max) = max {
                if v.chars().count() > max {
                    errors.add(field, too_long(max));
                }
            }
        }
    }
}

/// Fields accepted when creating or updating a board.
#[derive(Debug, Clone, Default)]
pub struct BoardInput {
    pub name: Option<String>,
    pub code: Option<String>,
}

/// Fields accepted when creating a thread.
#[derive(Debug, Clone, Default)]
pub struct ThreadInput {
    pub board: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    /// Path of an image already written to storage.
    pub image: Option<String>,
}

/// Fields accepted when creating a reply.
#[derive(Debug, Clone, Default)]
pub struct ReplyInput {
    pub text: Option<String>,
    pub thread: Option<i64>,
    pub reply: Option<i64>,
    /// Path of an image already written to storage.
    pub image: Option<String>,
}

/// Board service providing policy-checked operations.
pub struct BoardService<'a> {
    db: &'a Database,
}

impl<'a> BoardService<'a> {
    /// Create a new BoardService.
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ========== Boards ==========

    /// List all boards.
    pub async fn list_boards(&self, actor: Option<&Identity>) -> Result<Vec<Board>> {
        permit(actor, Action::List, Target::Board).into_result()?;
        BoardRepository::new(self.db.pool()).list_all().await
    }

    /// Get a board by ID.
    pub async fn get_board(&self, actor: Option<&Identity>, board_id: i64) -> Result<Board> {
        permit(actor, Action::Retrieve, Target::Board).into_result()?;
        BoardRepository::new(self.db.pool())
            .get_by_id(board_id)
            .await?
            .ok_or_else(|| ChanError::NotFound("board".to_string()))
    }

    /// Create a board owned by the acting administrator.
    pub async fn create_board(&self, actor: Option<&Identity>, input: BoardInput) -> Result<Board> {
        permit(actor, Action::Create, Target::Board).into_result()?;
        let owner = require_actor(actor)?;

        let mut errors = FieldErrors::new();
        require_text(
            &mut errors,
            "name",
            input.name.as_deref(),
            Some(MAX_BOARD_NAME_LENGTH),
        );
        require_text(
            &mut errors,
            "code",
            input.code.as_deref(),
            Some(MAX_BOARD_CODE_LENGTH),
        );
        self.check_board_uniqueness(&mut errors, &input, None).await?;
        errors.into_result()?;

        let (Some(name), Some(code)) = (input.name, input.code) else {
            return Err(ChanError::invalid(FieldErrors::NON_FIELD, REQUIRED));
        };

        let board = BoardRepository::new(self.db.pool())
            .create(&NewBoard::new(owner.id, name, code))
            .await?;

        info!(board_id = board.id, code = %board.code, owner_id = owner.id, "Board created");
        Ok(board)
    }

    /// Update a board. Absent fields are left unchanged; present ones must
    /// be valid.
    pub async fn update_board(
        &self,
        actor: Option<&Identity>,
        board_id: i64,
        input: BoardInput,
    ) -> Result<Board> {
        permit(actor, Action::Update, Target::Board).into_result()?;

        let repo = BoardRepository::new(self.db.pool());
        if !repo.exists(board_id).await? {
            return Err(ChanError::NotFound("board".to_string()));
        }

        let mut errors = FieldErrors::new();
        if input.name.is_some() {
            require_text(
                &mut errors,
                "name",
                input.name.as_deref(),
                Some(MAX_BOARD_NAME_LENGTH),
            );
        }
        if input.code.is_some() {
            require_text(
                &mut errors,
                "code",
                input.code.as_deref(),
                Some(MAX_BOARD_CODE_LENGTH),
            );
        }
        self.check_board_uniqueness(&mut errors, &input, Some(board_id))
            .await?;
        errors.into_result()?;

        let update = BoardUpdate {
            name: input.name,
            code: input.code,
        };
        let board = repo
            .update(board_id, &update)
            .await?
            .ok_or_else(|| ChanError::NotFound("board".to_string()))?;

        info!(board_id, "Board updated");
        Ok(board)
    }

    /// Delete a board with all its threads.
    pub async fn delete_board(&self, actor: Option<&Identity>, board_id: i64) -> Result<Removed> {
        permit(actor, Action::Delete, Target::Board).into_result()?;

        let removed = BoardRepository::new(self.db.pool())
            .delete(board_id)
            .await?
            .ok_or_else(|| ChanError::NotFound("board".to_string()))?;

        info!(board_id, threads = removed.threads, "Board deleted");
        Ok(removed)
    }

    async fn check_board_uniqueness(
        &self,
        errors: &mut FieldErrors,
        input: &BoardInput,
        exclude_id: Option<i64>,
    ) -> Result<()> {
        let repo = BoardRepository::new(self.db.pool());
        if let Some(ref name) = input.name {
            if errors.get("name").is_none() && repo.name_exists(name, exclude_id).await? {
                errors.add("name", already_exists("name"));
            }
        }
        if let Some(ref code) = input.code {
            if errors.get("code").is_none() && repo.code_exists(code, exclude_id).await? {
                errors.add("code", already_exists("code"));
            }
        }
        Ok(())
    }

    // ========== Threads ==========

    /// List threads, newest reply activity first.
    pub async fn list_threads(
        &self,
        actor: Option<&Identity>,
        filter: &ThreadFilter,
    ) -> Result<Vec<Thread>> {
        permit(actor, Action::List, Target::Thread { owner: None }).into_result()?;
        ThreadRepository::new(self.db.pool()).list(filter).await
    }

    /// Get a thread by ID.
    pub async fn get_thread(&self, actor: Option<&Identity>, thread_id: i64) -> Result<Thread> {
        let thread = self.find_thread(thread_id).await?;
        permit(
            actor,
            Action::Retrieve,
            Target::Thread {
                owner: Some(thread.owner_id),
            },
        )
        .into_result()?;
        Ok(thread)
    }

    /// Create a thread owned by the actor.
    pub async fn create_thread(&self, actor: Option<&Identity>, input: ThreadInput) -> Result<Thread> {
        permit(actor, Action::Create, Target::Thread { owner: None }).into_result()?;
        let owner = require_actor(actor)?;

        let mut errors = FieldErrors::new();
        require_text(
            &mut errors,
            "title",
            input.title.as_deref(),
            Some(MAX_TITLE_LENGTH),
        );
        require_text(&mut errors, "content", input.content.as_deref(), None);
        match input.board {
            None => errors.add("board", REQUIRED),
            Some(board_id) => {
                if !BoardRepository::new(self.db.pool()).exists(board_id).await? {
                    errors.add("board", invalid_pk(board_id));
                }
            }
        }
        errors.into_result()?;

        let (Some(board_id), Some(title), Some(content)) = (input.board, input.title, input.content)
        else {
            return Err(ChanError::invalid(FieldErrors::NON_FIELD, REQUIRED));
        };

        let thread = ThreadRepository::new(self.db.pool())
            .create(&NewThread::new(owner.id, board_id, title, content).with_image(input.image))
            .await?;

        info!(thread_id = thread.id, board_id, owner_id = owner.id, "Thread created");
        Ok(thread)
    }

    /// Look up a thread the actor is allowed to modify.
    pub async fn editable_thread(&self, actor: Option<&Identity>, thread_id: i64) -> Result<Thread> {
        require_actor(actor)?;
        let thread = self.find_thread(thread_id).await?;
        permit(
            actor,
            Action::Update,
            Target::Thread {
                owner: Some(thread.owner_id),
            },
        )
        .into_result()?;
        Ok(thread)
    }

    /// Apply a sparse update to a thread and mark it edited.
    pub async fn update_thread(
        &self,
        actor: Option<&Identity>,
        thread_id: i64,
        update: ThreadUpdate,
    ) -> Result<Thread> {
        self.editable_thread(actor, thread_id).await?;

        if let Some(ref title) = update.title {
            if title.chars().count() > MAX_TITLE_LENGTH {
                return Err(ChanError::invalid("title", too_long(MAX_TITLE_LENGTH)));
            }
        }

        let thread = ThreadRepository::new(self.db.pool())
            .update(thread_id, &update)
            .await?
            .ok_or_else(|| ChanError::NotFound("thread".to_string()))?;

        info!(thread_id, "Thread updated");
        Ok(thread)
    }

    /// Attach a stored image to a thread. Returns the thread and the image
    /// path it replaced, if any.
    pub async fn set_thread_image(
        &self,
        actor: Option<&Identity>,
        thread_id: i64,
        image: &str,
    ) -> Result<(Thread, Option<String>)> {
        let previous = self.editable_thread(actor, thread_id).await?.image;
        let thread = ThreadRepository::new(self.db.pool())
            .set_image(thread_id, image)
            .await?
            .ok_or_else(|| ChanError::NotFound("thread".to_string()))?;

        info!(thread_id, image, "Thread image set");
        Ok((thread, previous))
    }

    /// Delete a thread, its reply tree and its votes.
    pub async fn delete_thread(&self, actor: Option<&Identity>, thread_id: i64) -> Result<Removed> {
        require_actor(actor)?;
        let thread = self.find_thread(thread_id).await?;
        permit(
            actor,
            Action::Delete,
            Target::Thread {
                owner: Some(thread.owner_id),
            },
        )
        .into_result()?;

        let removed = ThreadRepository::new(self.db.pool())
            .delete(thread_id)
            .await?
            .ok_or_else(|| ChanError::NotFound("thread".to_string()))?;

        info!(thread_id, replies = removed.replies, "Thread deleted");
        Ok(removed)
    }

    async fn find_thread(&self, thread_id: i64) -> Result<Thread> {
        ThreadRepository::new(self.db.pool())
            .get_by_id(thread_id)
            .await?
            .ok_or_else(|| ChanError::NotFound("thread".to_string()))
    }

    // ========== Votes ==========

    /// Cast a vote on the thread at `thread_id`.
    ///
    /// `payload_thread` is the thread reference from the request body; it
    /// must name an existing thread and agree with `thread_id`.
    pub async fn vote(
        &self,
        actor: Option<&Identity>,
        thread_id: i64,
        payload_thread: i64,
        kind: VoteKind,
    ) -> Result<VoteOutcome> {
        let thread = self.find_thread(thread_id).await?;
        let action = match kind {
            VoteKind::Up => Action::Upvote,
            VoteKind::Down => Action::Downvote,
        };
        permit(
            actor,
            action,
            Target::Thread {
                owner: Some(thread.owner_id),
            },
        )
        .into_result()?;

        if payload_thread != thread_id {
            let message = if ThreadRepository::new(self.db.pool())
                .exists(payload_thread)
                .await?
            {
                format!("Must match the thread being voted on ({thread_id}).")
            } else {
                invalid_pk(payload_thread)
            };
            return Err(ChanError::invalid("thread", message));
        }

        // The ledger is keyed by user, so anonymous votes cannot be recorded.
        let voter = require_actor(actor)?;

        let outcome = VoteLedger::new(self.db.pool())
            .cast(voter.id, thread_id, kind)
            .await?;

        info!(thread_id, user_id = voter.id, %kind, ?outcome, "Vote cast");
        Ok(outcome)
    }

    // ========== Replies ==========

    /// List replies in creation order.
    pub async fn list_replies(
        &self,
        actor: Option<&Identity>,
        filter: &ReplyFilter,
    ) -> Result<Vec<Reply>> {
        permit(actor, Action::List, Target::Reply { owner: None }).into_result()?;
        ReplyRepository::new(self.db.pool()).list(filter).await
    }

    /// Get a reply by ID.
    pub async fn get_reply(&self, actor: Option<&Identity>, reply_id: i64) -> Result<Reply> {
        let reply = self.find_reply(reply_id).await?;
        permit(
            actor,
            Action::Retrieve,
            Target::Reply {
                owner: Some(reply.owner_id),
            },
        )
        .into_result()?;
        Ok(reply)
    }

    /// Create a reply attached to exactly one thread or reply.
    pub async fn create_reply(&self, actor: Option<&Identity>, input: ReplyInput) -> Result<Reply> {
        permit(actor, Action::Create, Target::Reply { owner: None }).into_result()?;
        let owner = require_actor(actor)?;

        let mut errors = FieldErrors::new();
        require_text(&mut errors, "text", input.text.as_deref(), None);

        let target = AttachTarget::from_refs(input.thread, input.reply);
        match target {
            None => errors.add(
                FieldErrors::NON_FIELD,
                "A reply must reference exactly one of thread or reply.",
            ),
            Some(AttachTarget::Thread(id)) => {
                if !ThreadRepository::new(self.db.pool()).exists(id).await? {
                    errors.add("thread", invalid_pk(id));
                }
            }
            Some(AttachTarget::Reply(id)) => {
                if !ReplyRepository::new(self.db.pool()).exists(id).await? {
                    errors.add("reply", invalid_pk(id));
                }
            }
        }
        errors.into_result()?;

        let (Some(text), Some(target)) = (input.text, target) else {
            return Err(ChanError::invalid(FieldErrors::NON_FIELD, REQUIRED));
        };

        let reply = ReplyRepository::new(self.db.pool())
            .create(&NewReply::new(owner.id, text, target).with_image(input.image))
            .await?;

        info!(reply_id = reply.id, ?target, owner_id = owner.id, "Reply created");
        Ok(reply)
    }

    /// Look up a reply the actor is allowed to modify.
    pub async fn editable_reply(&self, actor: Option<&Identity>, reply_id: i64) -> Result<Reply> {
        require_actor(actor)?;
        let reply = self.find_reply(reply_id).await?;
        permit(
            actor,
            Action::Update,
            Target::Reply {
                owner: Some(reply.owner_id),
            },
        )
        .into_result()?;
        Ok(reply)
    }

    /// Apply a sparse update to a reply and mark it edited.
    pub async fn update_reply(
        &self,
        actor: Option<&Identity>,
        reply_id: i64,
        update: ReplyUpdate,
    ) -> Result<Reply> {
        self.editable_reply(actor, reply_id).await?;

        let reply = ReplyRepository::new(self.db.pool())
            .update(reply_id, &update)
            .await?
            .ok_or_else(|| ChanError::NotFound("reply".to_string()))?;

        info!(reply_id, "Reply updated");
        Ok(reply)
    }

    /// Attach a stored image to a reply. Returns the reply and the image
    /// path it replaced, if any.
    pub async fn set_reply_image(
        &self,
        actor: Option<&Identity>,
        reply_id: i64,
        image: &str,
    ) -> Result<(Reply, Option<String>)> {
        let previous = self.editable_reply(actor, reply_id).await?.image;
        let reply = ReplyRepository::new(self.db.pool())
            .set_image(reply_id, image)
            .await?
            .ok_or_else(|| ChanError::NotFound("reply".to_string()))?;

        info!(reply_id, image, "Reply image set");
        Ok((reply, previous))
    }

    /// Delete a reply and everything attached below it.
    pub async fn delete_reply(&self, actor: Option<&Identity>, reply_id: i64) -> Result<Removed> {
        require_actor(actor)?;
        let reply = self.find_reply(reply_id).await?;
        permit(
            actor,
            Action::Delete,
            Target::Reply {
                owner: Some(reply.owner_id),
            },
        )
        .into_result()?;

        let removed = ReplyRepository::new(self.db.pool())
            .delete(reply_id)
            .await?
            .ok_or_else(|| ChanError::NotFound("reply".to_string()))?;

        info!(reply_id, replies = removed.replies, "Reply deleted");
        Ok(removed)
    }

    async fn find_reply(&self, reply_id: i64) -> Result<Reply> {
        ReplyRepository::new(self.db.pool())
            .get_by_id(reply_id)
            .await?
            .ok_or_else(|| ChanError::NotFound("reply".to_string()))
    }
}

/// The acting identity, or `Unauthorized` for anonymous callers.
fn require_actor(actor: Option<&Identity>) -> Result<&Identity> {
    actor.ok_or_else(|| {
        ChanError::Unauthorized("Authentication credentials were not provided.".to_string())
    })
}

//! Vote ledger storage for sixchan.
//!
//! Upvotes and downvotes live in two tables. Every cast reads the current
//! state and applies the transition inside one write transaction, so a swap
//! never leaves both rows or neither row behind, and casts by the same user
//! queue behind each other.

use sqlx::SqliteConnection;
use tracing::debug;

use super::vote::{transition, VoteKind, VoteOutcome, VoteState};
use crate::db::{begin_write, DbPool};
use crate::{ChanError, Result};

/// Up/down vote counts for a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VoteTally {
    pub upvotes: i64,
    pub downvotes: i64,
}

/// Repository applying vote transitions.
pub struct VoteLedger<'a> {
    pool: &'a DbPool,
}

impl<'a> VoteLedger<'a> {
    /// Create a new VoteLedger with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Cast a vote of `kind` by `user_id` on `thread_id`.
    ///
    /// The write lock is taken before the state lookup, so the lookup and
    /// the resulting delete/insert see no interleaved cast.
    pub async fn cast(&self, user_id: i64, thread_id: i64, kind: VoteKind) -> Result<VoteOutcome> {
        let mut tx = begin_write(self.pool).await?;

        let current = read_state(&mut *tx, user_id, thread_id).await?;
        let (next, outcome) = transition(current, kind);

        if let Some(table) = held_table(current) {
            sqlx::query(&format!(
                "DELETE FROM {table} WHERE user_id = ? AND thread_id = ?"
            ))
            .bind(user_id)
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
        }
        if let Some(table) = held_table(next) {
            sqlx::query(&format!(
                "INSERT INTO {table} (user_id, thread_id) VALUES (?, ?)"
            ))
            .bind(user_id)
            .bind(thread_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        debug!(user_id, thread_id, %kind, ?current, ?next, "Vote applied");
        Ok(outcome)
    }

    /// Current vote state of `user_id` on `thread_id`.
    pub async fn state(&self, user_id: i64, thread_id: i64) -> Result<VoteState> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
        read_state(&mut *conn, user_id, thread_id).await
    }

    /// Users holding a vote of `kind` on `thread_id`, in voting order.
    pub async fn voters(&self, thread_id: i64, kind: VoteKind) -> Result<Vec<i64>> {
        let table = kind.table();
        let voters: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT user_id FROM {table} WHERE thread_id = ? ORDER BY id"
        ))
        .bind(thread_id)
        .fetch_all(self.pool)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;
        Ok(voters)
    }

    /// Vote counts for `thread_id`.
    pub async fn tally(&self, thread_id: i64) -> Result<VoteTally> {
        let (upvotes, downvotes): (i64, i64) = sqlx::query_as(
            "SELECT (SELECT COUNT(*) FROM upvotes WHERE thread_id = ?),
                    (SELECT COUNT(*) FROM downvotes WHERE thread_id = ?)",
        )
        .bind(thread_id)
        .bind(thread_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(VoteTally { upvotes, downvotes })
    }
}

fn held_table(state: VoteState) -> Option<&'static str> {
    match state {
        VoteState::None => None,
        VoteState::Upvoted => Some(VoteKind::Up.table()),
        VoteState::Downvoted => Some(VoteKind::Down.table()),
    }
}

async fn read_state(conn: &mut SqliteConnection, user_id: i64, thread_id: i64) -> Result<VoteState> {
    let (up, down): (bool, bool) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM upvotes WHERE user_id = ? AND thread_id = ?),
                EXISTS(SELECT 1 FROM downvotes WHERE user_id = ? AND thread_id = ?)",
    )
    .bind(user_id)
    .bind(thread_id)
    .bind(user_id)
    .bind(thread_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| ChanError::Database(e.to_string()))?;

    match (up, down) {
        (false, false) => Ok(VoteState::None),
        (true, false) => Ok(VoteState::Upvoted),
        (false, true) => Ok(VoteState::Downvoted),
        (true, true) => Err(ChanError::Database(format!(
            "user {user_id} holds both votes on thread {thread_id}"
        ))),
    }
}

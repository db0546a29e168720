//! Cascading deletes over the reply tree.
//!
//! These helpers run on a connection that is already inside a transaction;
//! committing is the caller's job.

use sqlx::{QueryBuilder, SqliteConnection};
use tracing::debug;

use crate::{ChanError, Result};

/// Bound parameters per `IN (...)` list.
const CHUNK_SIZE: usize = 500;

/// Collect `seeds` and every reply reachable from them through `reply_id`.
///
/// The result is in breadth-first order, parents before children.
pub(super) async fn reply_closure(conn: &mut SqliteConnection, seeds: Vec<i64>) -> Result<Vec<i64>> {
    let mut all = seeds.clone();
    let mut frontier = seeds;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for chunk in frontier.chunks(CHUNK_SIZE) {
            let mut query: QueryBuilder<sqlx::Sqlite> =
                QueryBuilder::new("SELECT id FROM replies WHERE reply_id IN (");
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(*id);
            }
            separated.push_unseparated(")");

            let children: Vec<i64> = query
                .build_query_scalar()
                .fetch_all(&mut *conn)
                .await
                .map_err(|e| ChanError::Database(e.to_string()))?;
            next.extend(children);
        }
        all.extend_from_slice(&next);
        frontier = next;
    }

    Ok(all)
}

/// What a cascading delete removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Removed {
    /// Threads deleted.
    pub threads: u64,
    /// Replies deleted.
    pub replies: u64,
    /// Stored image paths of the deleted threads and replies. The files are
    /// left for the caller to remove once the transaction commits.
    pub images: Vec<String>,
}

impl Removed {
    fn absorb(&mut self, other: Removed) {
        self.threads += other.threads;
        self.replies += other.replies;
        self.images.extend(other.images);
    }
}

/// Image paths held by the given replies.
async fn reply_images(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<String>> {
    let mut images = Vec::new();
    for chunk in ids.chunks(CHUNK_SIZE) {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT image FROM replies WHERE image IS NOT NULL AND id IN (");
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let found: Vec<String> = query
            .build_query_scalar()
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
        images.extend(found);
    }
    Ok(images)
}

/// Delete replies by ID, children first. Returns their image paths.
async fn delete_replies(conn: &mut SqliteConnection, ids: &[i64]) -> Result<Vec<String>> {
    let images = reply_images(conn, ids).await?;
    let ordered: Vec<i64> = ids.iter().rev().copied().collect();

    for chunk in ordered.chunks(CHUNK_SIZE) {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("DELETE FROM replies WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in chunk {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
    }

    Ok(images)
}

/// Delete a reply and the whole subtree attached to it.
///
/// Returns `None` if `reply_id` did not exist.
pub(super) async fn delete_reply(conn: &mut SqliteConnection, reply_id: i64) -> Result<Option<Removed>> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM replies WHERE id = ?)")
        .bind(reply_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;
    if !exists {
        return Ok(None);
    }

    let ids = reply_closure(conn, vec![reply_id]).await?;
    let images = delete_replies(conn, &ids).await?;
    debug!(reply_id, deleted = ids.len(), "Deleted reply subtree");
    Ok(Some(Removed {
        threads: 0,
        replies: ids.len() as u64,
        images,
    }))
}

/// Delete a thread, every reply attached to it directly or transitively,
/// and its votes.
///
/// Returns `None` if the thread did not exist.
pub(super) async fn delete_thread(conn: &mut SqliteConnection, thread_id: i64) -> Result<Option<Removed>> {
    let thread_image: Option<Option<String>> =
        sqlx::query_scalar("SELECT image FROM threads WHERE id = ?")
            .bind(thread_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
    let Some(thread_image) = thread_image else {
        return Ok(None);
    };

    let direct: Vec<i64> = sqlx::query_scalar("SELECT id FROM replies WHERE thread_id = ?")
        .bind(thread_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;

    let ids = reply_closure(conn, direct).await?;
    let mut images = delete_replies(conn, &ids).await?;
    images.extend(thread_image);

    for table in ["upvotes", "downvotes"] {
        sqlx::query(&format!("DELETE FROM {table} WHERE thread_id = ?"))
            .bind(thread_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
    }

    sqlx::query("DELETE FROM threads WHERE id = ?")
        .bind(thread_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;

    debug!(thread_id, replies = ids.len(), "Deleted thread with reply tree");
    Ok(Some(Removed {
        threads: 1,
        replies: ids.len() as u64,
        images,
    }))
}

/// Delete a board and every thread in it.
///
/// Returns `None` if the board did not exist.
pub(super) async fn delete_board(conn: &mut SqliteConnection, board_id: i64) -> Result<Option<Removed>> {
    let thread_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM threads WHERE board_id = ?")
        .bind(board_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;

    let mut removed = Removed::default();
    for thread_id in thread_ids {
        if let Some(thread) = delete_thread(conn, thread_id).await? {
            removed.absorb(thread);
        }
    }

    let result = sqlx::query("DELETE FROM boards WHERE id = ?")
        .bind(board_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }

    debug!(board_id, threads = removed.threads, "Deleted board");
    Ok(Some(removed))
}

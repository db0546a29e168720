//! Thread repository for sixchan.
//!
//! This module provides CRUD operations for threads in the database.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::cascade::{self, Removed};
use super::thread::{NewThread, Thread, ThreadFilter, ThreadUpdate};
use crate::db::{begin_write, DbPool};
use crate::{ChanError, Result};

const THREAD_COLUMNS: &str =
    "t.id, t.owner_id, t.board_id, t.title, t.content, t.image, t.created_at, t.is_edited";

/// Repository for thread CRUD operations.
pub struct ThreadRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ThreadRepository<'a> {
    /// Create a new ThreadRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new thread in the database.
    ///
    /// Returns the created thread with the assigned ID.
    pub async fn create(&self, new_thread: &NewThread) -> Result<Thread> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO threads (owner_id, board_id, title, content, image, created_at)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(new_thread.owner_id)
        .bind(new_thread.board_id)
        .bind(&new_thread.title)
        .bind(&new_thread.content)
        .bind(&new_thread.image)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ChanError::NotFound("thread".to_string()))
    }

    /// Get a thread by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Thread>> {
        let sql = format!("SELECT {THREAD_COLUMNS} FROM threads t WHERE t.id = ?");
        let thread = sqlx::query_as::<_, Thread>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(thread)
    }

    /// List threads, most recent direct reply first.
    ///
    /// Threads without replies have no activity timestamp and fall where
    /// SQLite puts NULLs in a descending sort (last). No further tie-break
    /// is applied.
    pub async fn list(&self, filter: &ThreadFilter) -> Result<Vec<Thread>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {THREAD_COLUMNS} FROM threads t"));

        if !filter.boards.is_empty() {
            query.push(" WHERE t.board_id IN (");
            let mut separated = query.separated(", ");
            for board_id in &filter.boards {
                separated.push_bind(*board_id);
            }
            separated.push_unseparated(")");
        }

        query.push(
            " ORDER BY (SELECT MAX(r.created_at) FROM replies r WHERE r.thread_id = t.id) DESC",
        );

        let threads = query
            .build_query_as::<Thread>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(threads)
    }

    /// Update a thread by ID.
    ///
    /// Only fields that are set in the update will be modified, and the
    /// thread is marked as edited even when nothing else changes.
    /// Returns the updated thread, or None if not found.
    pub async fn update(&self, id: i64, update: &ThreadUpdate) -> Result<Option<Thread>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE threads SET is_edited = 1");

        if let Some(ref title) = update.title {
            query.push(", title = ");
            query.push_bind(title);
        }
        if let Some(ref content) = update.content {
            query.push(", content = ");
            query.push_bind(content);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Replace the image of an existing thread. Counts as an edit, unlike
    /// an image given at creation.
    ///
    /// Returns the updated thread, or None if not found.
    pub async fn set_image(&self, id: i64, image: &str) -> Result<Option<Thread>> {
        let result = sqlx::query("UPDATE threads SET image = ?, is_edited = 1 WHERE id = ?")
            .bind(image)
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a thread with its whole reply tree and all of its votes.
    ///
    /// Runs in a single transaction. Returns `None` if the thread did not
    /// exist.
    pub async fn delete(&self, id: i64) -> Result<Option<Removed>> {
        let mut tx = begin_write(self.pool).await?;

        let deleted = cascade::delete_thread(&mut *tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(deleted)
    }

    /// Check if a thread exists.
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM threads WHERE id = ?)")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardRepository, NewBoard};
    use crate::db::{NewUser, UserRepository};
    use crate::Database;

    async fn setup_db() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let user = UserRepository::new(db.pool())
            .create(&NewUser::new("poster", "poster@example.com", "hash"))
            .await
            .unwrap();
        let board = BoardRepository::new(db.pool())
            .create(&NewBoard::new(user.id, "Random", "b"))
            .await
            .unwrap();
        (db, user.id, board.id)
    }

    async fn insert_reply(db: &Database, owner_id: i64, thread_id: i64, created_at: &str) {
        sqlx::query(
            "INSERT INTO replies (owner_id, text, created_at, thread_id) VALUES (?, 'r', ?, ?)",
        )
        .bind(owner_id)
        .bind(created_at)
        .bind(thread_id)
        .execute(db.pool())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_and_get_thread() {
        let (db, user_id, board_id) = setup_db().await;
        let repo = ThreadRepository::new(db.pool());

        let thread = repo
            .create(&NewThread::new(user_id, board_id, "Hello", "World"))
            .await
            .unwrap();

        assert_eq!(thread.owner_id, user_id);
        assert_eq!(thread.board_id, board_id);
        assert_eq!(thread.title, "Hello");
        assert_eq!(thread.content, "World");
        assert!(thread.image.is_none());
        assert!(!thread.is_edited);

        let found = repo.get_by_id(thread.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Hello");
        assert!(repo.get_by_id(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_is_sparse_and_marks_edited() {
        let (db, user_id, board_id) = setup_db().await;
        let repo = ThreadRepository::new(db.pool());

        let thread = repo
            .create(&NewThread::new(user_id, board_id, "Title", "Content"))
            .await
            .unwrap();

        let updated = repo
            .update(thread.id, &ThreadUpdate::new().content("Changed"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Title");
        assert_eq!(updated.content, "Changed");
        assert!(updated.is_edited);

        // An empty update still marks the thread as edited.
        let other = repo
            .create(&NewThread::new(user_id, board_id, "Other", "Body"))
            .await
            .unwrap();
        let touched = repo
            .update(other.id, &ThreadUpdate::new())
            .await
            .unwrap()
            .unwrap();
        assert!(touched.is_edited);
        assert_eq!(touched.title, "Other");

        assert!(repo.update(999, &ThreadUpdate::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_image() {
        let (db, user_id, board_id) = setup_db().await;
        let repo = ThreadRepository::new(db.pool());

        let thread = repo
            .create(&NewThread::new(user_id, board_id, "Title", "Content"))
            .await
            .unwrap();

        let updated = repo
            .set_image(thread.id, "uploads/thread/abc.png")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.image.as_deref(), Some("uploads/thread/abc.png"));
        assert!(updated.is_edited);

        let posted = repo
            .create(
                &NewThread::new(user_id, board_id, "With image", "Content")
                    .with_image(Some("uploads/thread/def.png".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(posted.image.as_deref(), Some("uploads/thread/def.png"));
        assert!(!posted.is_edited);
    }

    #[tokio::test]
    async fn test_list_filters_by_board() {
        let (db, user_id, board_id) = setup_db().await;
        let other_board = BoardRepository::new(db.pool())
            .create(&NewBoard::new(user_id, "Tech", "g"))
            .await
            .unwrap();
        let repo = ThreadRepository::new(db.pool());

        repo.create(&NewThread::new(user_id, board_id, "A", "a"))
            .await
            .unwrap();
        repo.create(&NewThread::new(user_id, other_board.id, "B", "b"))
            .await
            .unwrap();

        assert_eq!(repo.list(&ThreadFilter::all()).await.unwrap().len(), 2);

        let only_first = repo.list(&ThreadFilter::boards(vec![board_id])).await.unwrap();
        assert_eq!(only_first.len(), 1);
        assert_eq!(only_first[0].title, "A");

        let both = repo
            .list(&ThreadFilter::boards(vec![board_id, other_board.id]))
            .await
            .unwrap();
        assert_eq!(both.len(), 2);
    }

    #[tokio::test]
    async fn test_list_orders_by_latest_reply() {
        let (db, user_id, board_id) = setup_db().await;
        let repo = ThreadRepository::new(db.pool());

        let old = repo
            .create(&NewThread::new(user_id, board_id, "Old activity", "x"))
            .await
            .unwrap();
        let recent = repo
            .create(&NewThread::new(user_id, board_id, "Recent activity", "x"))
            .await
            .unwrap();
        let quiet = repo
            .create(&NewThread::new(user_id, board_id, "No replies", "x"))
            .await
            .unwrap();

        insert_reply(&db, user_id, old.id, "2024-01-01T00:00:00+00:00").await;
        insert_reply(&db, user_id, recent.id, "2024-01-01T00:00:00+00:00").await;
        insert_reply(&db, user_id, recent.id, "2024-03-01T00:00:00+00:00").await;

        let ids: Vec<i64> = repo
            .list(&ThreadFilter::all())
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();

        assert_eq!(ids, vec![recent.id, old.id, quiet.id]);
    }

    #[tokio::test]
    async fn test_delete_cascades_replies_and_votes() {
        let (db, user_id, board_id) = setup_db().await;
        let repo = ThreadRepository::new(db.pool());

        let thread = repo
            .create(&NewThread::new(user_id, board_id, "Doomed", "x"))
            .await
            .unwrap();
        insert_reply(&db, user_id, thread.id, "2024-01-01T00:00:00+00:00").await;
        sqlx::query(
            "INSERT INTO replies (owner_id, text, created_at, reply_id) VALUES (?, 'nested', ?, 1)",
        )
        .bind(user_id)
        .bind("2024-01-02T00:00:00+00:00")
        .execute(db.pool())
        .await
        .unwrap();
        sqlx::query("INSERT INTO upvotes (user_id, thread_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(thread.id)
            .execute(db.pool())
            .await
            .unwrap();

        let removed = repo.delete(thread.id).await.unwrap().unwrap();
        assert_eq!(removed.threads, 1);
        assert_eq!(removed.replies, 2);
        assert!(!repo.exists(thread.id).await.unwrap());

        let replies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM replies")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let votes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM upvotes")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(replies, 0);
        assert_eq!(votes, 0);

        assert!(repo.delete(thread.id).await.unwrap().is_none());
    }
}

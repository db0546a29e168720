//! Reply repository for sixchan.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::cascade::{self, Removed};
use super::reply::{NewReply, Reply, ReplyFilter, ReplyUpdate};
use crate::db::{begin_write, DbPool};
use crate::{ChanError, Result};

const REPLY_COLUMNS: &str =
    "id, owner_id, text, image, created_at, thread_id, reply_id, is_edited, is_deleted";

/// Repository for reply CRUD operations.
pub struct ReplyRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> ReplyRepository<'a> {
    /// Create a new ReplyRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new reply in the database.
    pub async fn create(&self, new_reply: &NewReply) -> Result<Reply> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO replies (owner_id, text, image, created_at, thread_id, reply_id)
             VALUES (?, ?, ?, ?, ?, ?) RETURNING id",
        )
        .bind(new_reply.owner_id)
        .bind(&new_reply.text)
        .bind(&new_reply.image)
        .bind(Utc::now())
        .bind(new_reply.target.thread_id())
        .bind(new_reply.target.reply_id())
        .fetch_one(self.pool)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ChanError::NotFound("reply".to_string()))
    }

    /// Get a reply by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Reply>> {
        let sql = format!("SELECT {REPLY_COLUMNS} FROM replies WHERE id = ?");
        let reply = sqlx::query_as::<_, Reply>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(reply)
    }

    /// List replies in creation order, optionally narrowed by attachment.
    pub async fn list(&self, filter: &ReplyFilter) -> Result<Vec<Reply>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {REPLY_COLUMNS} FROM replies WHERE 1 = 1"));

        if let Some(thread_id) = filter.thread {
            query.push(" AND thread_id = ");
            query.push_bind(thread_id);
        }
        if let Some(reply_id) = filter.reply {
            query.push(" AND reply_id = ");
            query.push_bind(reply_id);
        }
        query.push(" ORDER BY created_at ASC, id ASC");

        let replies = query
            .build_query_as::<Reply>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(replies)
    }

    /// Update a reply by ID and mark it as edited.
    ///
    /// Returns the updated reply, or None if not found.
    pub async fn update(&self, id: i64, update: &ReplyUpdate) -> Result<Option<Reply>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE replies SET is_edited = 1");

        if let Some(ref text) = update.text {
            query.push(", text = ");
            query.push_bind(text);
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

    /// Replace the image of an existing reply. Counts as an edit, unlike an
    /// image given at creation.
    pub async fn set_image(&self, id: i64, image: &str) -> Result<Option<Reply>> {
        let result = sqlx::query("UPDATE replies SET image = ?, is_edited = 1 WHERE id = ?")
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

    /// Delete a reply and every reply attached to it, transitively.
    ///
    /// Runs in a single transaction. Returns `None` if the reply did not
    /// exist.
    pub async fn delete(&self, id: i64) -> Result<Option<Removed>> {
        let mut tx = begin_write(self.pool).await?;

        let deleted = cascade::delete_reply(&mut *tx, id).await?;

        tx.commit()
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(deleted)
    }

    /// Check if a reply exists.
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM replies WHERE id = ?)")
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
    use crate::board::{AttachTarget, BoardRepository, NewBoard, NewThread, ThreadRepository};
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
        let thread = ThreadRepository::new(db.pool())
            .create(&NewThread::new(user.id, board.id, "Thread", "Body"))
            .await
            .unwrap();
        (db, user.id, thread.id)
    }

    #[tokio::test]
    async fn test_create_reply_on_thread_and_reply() {
        let (db, user_id, thread_id) = setup_db().await;
        let repo = ReplyRepository::new(db.pool());

        let top = repo
            .create(&NewReply::new(user_id, "first", AttachTarget::Thread(thread_id)))
            .await
            .unwrap();
        assert_eq!(top.thread_id, Some(thread_id));
        assert_eq!(top.reply_id, None);
        assert_eq!(top.target(), Some(AttachTarget::Thread(thread_id)));
        assert!(!top.is_edited);
        assert!(!top.is_deleted);

        let nested = repo
            .create(&NewReply::new(user_id, "second", AttachTarget::Reply(top.id)))
            .await
            .unwrap();
        assert_eq!(nested.thread_id, None);
        assert_eq!(nested.reply_id, Some(top.id));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (db, user_id, thread_id) = setup_db().await;
        let repo = ReplyRepository::new(db.pool());

        let top = repo
            .create(&NewReply::new(user_id, "top", AttachTarget::Thread(thread_id)))
            .await
            .unwrap();
        repo.create(&NewReply::new(user_id, "child", AttachTarget::Reply(top.id)))
            .await
            .unwrap();

        assert_eq!(repo.list(&ReplyFilter::default()).await.unwrap().len(), 2);

        let by_thread = repo
            .list(&ReplyFilter {
                thread: Some(thread_id),
                reply: None,
            })
            .await
            .unwrap();
        assert_eq!(by_thread.len(), 1);
        assert_eq!(by_thread[0].text, "top");

        let by_reply = repo
            .list(&ReplyFilter {
                thread: None,
                reply: Some(top.id),
            })
            .await
            .unwrap();
        assert_eq!(by_reply.len(), 1);
        assert_eq!(by_reply[0].text, "child");
    }

    #[tokio::test]
    async fn test_update_marks_edited() {
        let (db, user_id, thread_id) = setup_db().await;
        let repo = ReplyRepository::new(db.pool());

        let reply = repo
            .create(&NewReply::new(user_id, "original", AttachTarget::Thread(thread_id)))
            .await
            .unwrap();

        let updated = repo
            .update(reply.id, &ReplyUpdate::sparse(Some(String::new())))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "original");
        assert!(updated.is_edited);

        let updated = repo
            .update(reply.id, &ReplyUpdate::new().text("changed"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.text, "changed");
        assert_eq!(updated.thread_id, Some(thread_id));
    }

    #[tokio::test]
    async fn test_delete_removes_subtree_only() {
        let (db, user_id, thread_id) = setup_db().await;
        let repo = ReplyRepository::new(db.pool());

        let root = repo
            .create(&NewReply::new(user_id, "root", AttachTarget::Thread(thread_id)))
            .await
            .unwrap();
        let sibling = repo
            .create(&NewReply::new(user_id, "sibling", AttachTarget::Thread(thread_id)))
            .await
            .unwrap();
        let child = repo
            .create(
                &NewReply::new(user_id, "child", AttachTarget::Reply(root.id))
                    .with_image(Some("uploads/reply/child.png".to_string())),
            )
            .await
            .unwrap();
        assert!(!child.is_edited);
        let grandchild = repo
            .create(&NewReply::new(user_id, "grandchild", AttachTarget::Reply(child.id)))
            .await
            .unwrap();

        let removed = repo.delete(root.id).await.unwrap().unwrap();
        assert_eq!(removed.replies, 3);
        assert_eq!(removed.images, vec!["uploads/reply/child.png".to_string()]);

        assert!(!repo.exists(root.id).await.unwrap());
        assert!(!repo.exists(child.id).await.unwrap());
        assert!(!repo.exists(grandchild.id).await.unwrap());
        assert!(repo.exists(sibling.id).await.unwrap());
        assert_eq!(repo.list(&ReplyFilter::default()).await.unwrap().len(), 1);

        assert!(repo.delete(root.id).await.unwrap().is_none());
    }
}

//! Board repository for sixchan.
//!
//! This module provides CRUD operations for boards in the database.

use chrono::Utc;
use sqlx::QueryBuilder;

use super::cascade::{self, Removed};
use super::types::{Board, BoardUpdate, NewBoard};
use crate::db::{begin_write, DbPool};
use crate::{ChanError, Result};

/// Message for a name or code already taken by another board.
pub(super) fn already_exists(field: &str) -> String {
    format!("board with this {field} already exists.")
}

/// Map a failed insert or update. A UNIQUE violation on `name` or `code`
/// becomes a field error on that field.
fn write_error(e: sqlx::Error) -> ChanError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            for field in ["name", "code"] {
                if db_err.message().contains(&format!("boards.{field}")) {
                    return ChanError::invalid(field, already_exists(field));
                }
            }
        }
    }
    ChanError::Database(e.to_string())
}

/// Repository for board CRUD operations.
pub struct BoardRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> BoardRepository<'a> {
    /// Create a new BoardRepository with the given database pool reference.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new board in the database.
    ///
    /// Returns the created board with the assigned ID.
    pub async fn create(&self, new_board: &NewBoard) -> Result<Board> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO boards (owner_id, name, code, created_at) VALUES (?, ?, ?, ?) RETURNING id",
        )
        .bind(new_board.owner_id)
        .bind(&new_board.name)
        .bind(&new_board.code)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(write_error)?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| ChanError::NotFound("board".to_string()))
    }

    /// Get a board by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Board>> {
        let board = sqlx::query_as::<_, Board>(
            "SELECT id, owner_id, name, code, created_at FROM boards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(board)
    }

    /// Update a board by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated board, or None if not found.
    pub async fn update(&self, id: i64, update: &BoardUpdate) -> Result<Option<Board>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE boards SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref code) = update.code {
            separated.push("code = ");
            separated.push_bind_unseparated(code);
        }

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// Delete a board together with its threads, their reply trees and votes.
    ///
    /// Everything is removed in one transaction. Returns `None` if the board
    /// did not exist.
    pub async fn delete(&self, id: i64) -> Result<Option<Removed>> {
        let mut tx = begin_write(self.pool).await?;
        let removed = cascade::delete_board(&mut *tx, id).await?;
        tx.commit()
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
        Ok(removed)
    }

    /// List all boards in creation order.
    pub async fn list_all(&self) -> Result<Vec<Board>> {
        let boards = sqlx::query_as::<_, Board>(
            "SELECT id, owner_id, name, code, created_at FROM boards ORDER BY id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;

        Ok(boards)
    }

    /// Check if a board name is taken by a board other than `exclude_id`.
    pub async fn name_exists(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM boards WHERE name = ? AND id != COALESCE(?, -1))",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Check if a board code is taken by a board other than `exclude_id`.
    pub async fn code_exists(&self, code: &str, exclude_id: Option<i64>) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM boards WHERE code = ? AND id != COALESCE(?, -1))",
        )
        .bind(code)
        .bind(exclude_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| ChanError::Database(e.to_string()))?;
        Ok(exists)
    }

    /// Check if a board exists.
    pub async fn exists(&self, id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM boards WHERE id = ?)")
            .bind(id)
            .fetch_one(self.pool)
            .await
            .map_err(|e| ChanError::Database(e.to_string()))?;
        Ok(exists)
    }
}

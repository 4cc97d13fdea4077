use anyhow::{Context, Result};
use rusqlite::OptionalExtension;

use monotext_types::Comment;

use crate::db::{now, timestamp_column, to_db_timestamp, DbPool};

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.owner_id, u.username, c.text, c.created_at, c.updated_at
     FROM comments c
     JOIN users u ON c.owner_id = u.id";

fn map_comment(row: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        owner_id: row.get(2)?,
        owner_username: row.get(3)?,
        text: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}

pub struct CommentRepository {
    pool: DbPool,
}

impl CommentRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Attach a new comment to a post and return its ID
    pub fn create(&self, post_id: i64, owner_id: i64, text: &str) -> Result<i64> {
        let conn = self.pool.get()?;
        let created_at = to_db_timestamp(&now());
        conn.execute(
            "INSERT INTO comments (post_id, owner_id, text, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            (post_id, owner_id, text, &created_at, &created_at),
        )
        .context("Failed to create comment")?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_by_id(&self, comment_id: i64) -> Result<Option<Comment>> {
        let conn = self.pool.get()?;
        let comment = conn
            .query_row(
                &format!("{} WHERE c.id = ?", COMMENT_SELECT),
                [comment_id],
                map_comment,
            )
            .optional()?;
        Ok(comment)
    }

    pub fn count_for_post(&self, post_id: i64) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM comments WHERE post_id = ?",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// One page of a post's comments, newest first
    pub fn list_for_post_page(&self, post_id: i64, offset: u64, limit: u64) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE c.post_id = ? ORDER BY c.created_at DESC, c.id DESC LIMIT ? OFFSET ?",
            COMMENT_SELECT
        ))?;
        let comments = stmt
            .query_map((post_id, limit as i64, offset as i64), map_comment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }

    /// Every comment written by a user, oldest first
    pub fn list_by_owner(&self, owner_id: i64) -> Result<Vec<Comment>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE c.owner_id = ? ORDER BY c.created_at ASC, c.id ASC",
            COMMENT_SELECT
        ))?;
        let comments = stmt
            .query_map([owner_id], map_comment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }
}

use anyhow::{Context, Result};
use rusqlite::OptionalExtension;

use monotext_types::Like;

use crate::db::{now, timestamp_column, to_db_timestamp, DbPool};

pub struct LikeRepository {
    pool: DbPool,
}

impl LikeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Record that a user likes a post.
    ///
    /// Fails with a constraint violation if the pair already exists.
    pub fn create(&self, post_id: i64, owner_id: i64) -> Result<Like> {
        let conn = self.pool.get()?;
        let created_at = now();
        conn.execute(
            "INSERT INTO likes (post_id, owner_id, created_at) VALUES (?, ?, ?)",
            (post_id, owner_id, to_db_timestamp(&created_at)),
        )
        .context("Failed to create like")?;
        Ok(Like {
            id: conn.last_insert_rowid(),
            post_id,
            owner_id,
            created_at,
        })
    }

    pub fn get(&self, post_id: i64, owner_id: i64) -> Result<Option<Like>> {
        let conn = self.pool.get()?;
        let like = conn
            .query_row(
                "SELECT id, post_id, owner_id, created_at FROM likes WHERE post_id = ? AND owner_id = ?",
                (post_id, owner_id),
                |row| {
                    Ok(Like {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        owner_id: row.get(2)?,
                        created_at: timestamp_column(row, 3)?,
                    })
                },
            )
            .optional()?;
        Ok(like)
    }

    /// Remove a like; returns false if there was none
    pub fn delete(&self, post_id: i64, owner_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM likes WHERE post_id = ? AND owner_id = ?",
                (post_id, owner_id),
            )
            .context("Failed to delete like")?;
        Ok(rows > 0)
    }

    pub fn exists(&self, post_id: i64, owner_id: i64) -> Result<bool> {
        Ok(self.get(post_id, owner_id)?.is_some())
    }

    pub fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Like the post if the user doesn't yet, otherwise take the like back.
    ///
    /// Returns the new state and the post's like count, read in the same transaction.
    pub fn toggle(&self, post_id: i64, owner_id: i64) -> Result<(bool, i64)> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction().context("Failed to start like transaction")?;

        let removed = tx.execute(
            "DELETE FROM likes WHERE post_id = ? AND owner_id = ?",
            (post_id, owner_id),
        )?;
        let liked = if removed == 0 {
            tx.execute(
                "INSERT INTO likes (post_id, owner_id, created_at) VALUES (?, ?, ?)",
                (post_id, owner_id, to_db_timestamp(&now())),
            )?;
            true
        } else {
            false
        };

        let count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM likes WHERE post_id = ?",
            [post_id],
            |row| row.get(0),
        )?;
        tx.commit().context("Failed to commit like toggle")?;

        tracing::debug!(post_id, owner_id, liked, "Toggled like");
        Ok((liked, count))
    }

    /// Likes received across all of a user's posts
    pub fn count_received_by_user(&self, user_id: i64) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*)
             FROM likes l
             JOIN posts p ON l.post_id = p.id
             WHERE p.owner_id = ?",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

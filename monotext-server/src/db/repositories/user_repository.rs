use anyhow::{Context, Result};
use rusqlite::OptionalExtension;

use monotext_types::User;

use crate::db::{now, timestamp_column, to_db_timestamp, DbPool};

const USER_COLUMNS: &str = "u.id, u.username, u.date_joined, up.picture
     FROM users u
     LEFT JOIN user_pictures up ON up.user_id = u.id";

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        date_joined: timestamp_column(row, 2)?,
        picture: row.get(3)?,
    })
}

/// Stored login material for a user
#[derive(Debug, Clone)]
pub struct Credentials {
    pub user_id: i64,
    pub password_hash: String,
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new user with an already hashed password
    pub fn create(&self, username: &str, password_hash: &str) -> Result<User> {
        let conn = self.pool.get()?;
        let date_joined = now();
        conn.execute(
            "INSERT INTO users (username, password_hash, date_joined) VALUES (?, ?, ?)",
            (username, password_hash, to_db_timestamp(&date_joined)),
        )
        .context("Failed to create user")?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            date_joined,
            picture: None,
        })
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} WHERE u.id = ?", USER_COLUMNS),
                [user_id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by username (case-insensitive)
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {} WHERE u.username = ?", USER_COLUMNS),
                [username],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Look up the password hash for a username
    pub fn get_credentials(&self, username: &str) -> Result<Option<Credentials>> {
        let conn = self.pool.get()?;
        let credentials = conn
            .query_row(
                "SELECT id, password_hash FROM users WHERE username = ?",
                [username],
                |row| {
                    Ok(Credentials {
                        user_id: row.get(0)?,
                        password_hash: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(credentials)
    }

    pub fn username_exists(&self, username: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?",
            [username],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> UserRepository {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        UserRepository::new(db.pool)
    }

    #[test]
    fn test_create_and_fetch_user() {
        let repo = setup();
        let user = repo.create("Jack", "hash").expect("Failed to create user");
        assert_eq!(user.id, 1);

        let fetched = repo.get_by_id(user.id).unwrap().expect("User should exist");
        assert_eq!(fetched, user);
        assert!(fetched.picture.is_none());
    }

    #[test]
    fn test_username_lookup_ignores_case() {
        let repo = setup();
        repo.create("Sparrow", "hash").unwrap();

        assert!(repo.get_by_username("sparrow").unwrap().is_some());
        assert!(repo.username_exists("SPARROW").unwrap());
        assert!(!repo.username_exists("jack").unwrap());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let repo = setup();
        repo.create("Jack", "hash").unwrap();
        let err = repo.create("jack", "hash").unwrap_err();
        assert!(crate::db::is_constraint_violation(&err));
    }

    #[test]
    fn test_get_credentials() {
        let repo = setup();
        let user = repo.create("Jack", "sha256$1$00$00").unwrap();

        let credentials = repo.get_credentials("Jack").unwrap().unwrap();
        assert_eq!(credentials.user_id, user.id);
        assert_eq!(credentials.password_hash, "sha256$1$00$00");
        assert!(repo.get_credentials("nobody").unwrap().is_none());
    }
}

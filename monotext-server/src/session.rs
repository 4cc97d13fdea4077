use crate::db::{to_db_timestamp, Database};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Database-backed session manager for persistent authentication
///
/// Manages user sessions with token-based authentication, including:
/// - Session creation with UUID v4 tokens
/// - Session validation with expiry checking
/// - Session deletion (logout)
/// - Cleanup of expired sessions
#[derive(Clone)]
pub struct SessionManager {
    db: Database,
    lifetime: Duration,
}

impl SessionManager {
    /// Create a new session manager whose sessions last `lifetime_days`
    pub fn new(db: Database, lifetime_days: i64) -> Self {
        Self {
            db,
            lifetime: Duration::days(lifetime_days),
        }
    }

    /// Create a new session for a user and return its token
    pub fn create_session(&self, user_id: i64) -> Result<String> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + self.lifetime;

        let conn = self.db.connection()?;
        conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                token,
                user_id,
                to_db_timestamp(&created_at),
                to_db_timestamp(&expires_at),
            ],
        )
        .context("Failed to create session")?;

        tracing::info!("Created session for user {}", user_id);
        Ok(token)
    }

    /// Validate a session token and return the associated user ID
    ///
    /// Expired sessions are deleted and rejected.
    pub fn validate_session(&self, token: &str) -> Result<i64> {
        let conn = self.db.connection()?;

        let (user_id, expires_at_str): (i64, String) = conn
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                rusqlite::params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .context("Session not found")?;
        drop(conn);

        let expires_at = DateTime::parse_from_rfc3339(&expires_at_str)
            .context("Failed to parse expiry time")?
            .with_timezone(&Utc);

        if Utc::now() > expires_at {
            self.delete_session(token)?;
            anyhow::bail!("Session has expired");
        }

        Ok(user_id)
    }

    /// Delete a session (logout)
    pub fn delete_session(&self, token: &str) -> Result<()> {
        let conn = self.db.connection()?;
        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE token = ?1",
                rusqlite::params![token],
            )
            .context("Failed to delete session")?;

        if rows_affected > 0 {
            tracing::info!("Deleted session");
        }

        Ok(())
    }

    /// Remove every session past its expiry time; returns how many were removed
    pub fn cleanup_expired_sessions(&self) -> Result<usize> {
        let conn = self.db.connection()?;
        let now = to_db_timestamp(&Utc::now());

        let rows_affected = conn
            .execute(
                "DELETE FROM sessions WHERE expires_at < ?1",
                rusqlite::params![now],
            )
            .context("Failed to cleanup expired sessions")?;

        if rows_affected > 0 {
            tracing::info!("Cleaned up {} expired sessions", rows_affected);
        }

        Ok(rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::UserRepository;

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        let user = UserRepository::new(db.pool.clone())
            .create("testuser", "hash")
            .expect("Failed to create test user");
        (db, user.id)
    }

    fn expire(db: &Database, token: &str) {
        let conn = db.connection().expect("Failed to get connection");
        let expired_time = to_db_timestamp(&(Utc::now() - Duration::days(1)));
        conn.execute(
            "UPDATE sessions SET expires_at = ?1 WHERE token = ?2",
            rusqlite::params![expired_time, token],
        )
        .expect("Failed to expire session");
    }

    #[test]
    fn test_create_and_validate_session() {
        let (db, user_id) = setup();
        let manager = SessionManager::new(db, 30);

        let token = manager.create_session(user_id).expect("Failed to create session");
        assert!(Uuid::parse_str(&token).is_ok(), "Token should be a valid UUID");
        assert_eq!(manager.validate_session(&token).unwrap(), user_id);
    }

    #[test]
    fn test_validate_invalid_session() {
        let (db, _) = setup();
        let manager = SessionManager::new(db, 30);
        assert!(manager.validate_session("invalid-token").is_err());
    }

    #[test]
    fn test_delete_session() {
        let (db, user_id) = setup();
        let manager = SessionManager::new(db, 30);

        let token = manager.create_session(user_id).unwrap();
        manager.delete_session(&token).expect("Failed to delete session");
        assert!(manager.validate_session(&token).is_err());
    }

    #[test]
    fn test_expired_session_is_rejected_and_removed() {
        let (db, user_id) = setup();
        let manager = SessionManager::new(db.clone(), 30);

        let token = manager.create_session(user_id).unwrap();
        expire(&db, &token);

        assert!(manager.validate_session(&token).is_err());
        let remaining: i64 = db
            .connection()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn test_cleanup_expired_sessions() {
        let (db, user_id) = setup();
        let manager = SessionManager::new(db.clone(), 30);

        let stale = manager.create_session(user_id).unwrap();
        let fresh = manager.create_session(user_id).unwrap();
        expire(&db, &stale);

        assert_eq!(manager.cleanup_expired_sessions().unwrap(), 1);
        assert!(manager.validate_session(&stale).is_err());
        assert!(manager.validate_session(&fresh).is_ok());
    }

    #[test]
    fn test_session_token_uniqueness() {
        let (db, user_id) = setup();
        let manager = SessionManager::new(db, 30);

        let token1 = manager.create_session(user_id).unwrap();
        let token2 = manager.create_session(user_id).unwrap();
        assert_ne!(token1, token2);
    }
}

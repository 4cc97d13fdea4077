use anyhow::{Context, Result};
use rusqlite::OptionalExtension;

use monotext_types::UserPicture;

use crate::db::DbPool;

pub struct PictureRepository {
    pool: DbPool,
}

impl PictureRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn get(&self, user_id: i64) -> Result<Option<UserPicture>> {
        let conn = self.pool.get()?;
        let picture = conn
            .query_row(
                "SELECT user_id, picture FROM user_pictures WHERE user_id = ?",
                [user_id],
                |row| {
                    Ok(UserPicture {
                        user_id: row.get(0)?,
                        picture: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(picture)
    }

    /// Insert or replace the user's avatar index
    pub fn set(&self, user_id: i64, picture: i32) -> Result<UserPicture> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO user_pictures (user_id, picture) VALUES (?, ?)
             ON CONFLICT(user_id) DO UPDATE SET picture = excluded.picture",
            (user_id, picture),
        )
        .context("Failed to set user picture")?;
        Ok(UserPicture { user_id, picture })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::UserRepository;
    use crate::db::Database;

    fn setup() -> (Database, i64) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        let jack = UserRepository::new(db.pool.clone())
            .create("Jack", "hash")
            .unwrap()
            .id;
        (db, jack)
    }

    #[test]
    fn test_set_and_replace_picture() {
        let (db, jack) = setup();
        let repo = PictureRepository::new(db.pool.clone());
        assert!(repo.get(jack).unwrap().is_none());

        repo.set(jack, 1).unwrap();
        repo.set(jack, 0).unwrap();
        assert_eq!(repo.get(jack).unwrap().unwrap().picture, 0);

        // The user row reflects the selection
        let user = UserRepository::new(db.pool).get_by_id(jack).unwrap().unwrap();
        assert_eq!(user.picture, Some(0));
    }

    #[test]
    fn test_out_of_range_rejected_by_schema() {
        let (db, jack) = setup();
        let repo = PictureRepository::new(db.pool);
        assert!(repo.set(jack, 2).is_err());
        assert!(repo.set(jack, -1).is_err());
    }
}

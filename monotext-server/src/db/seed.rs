use anyhow::Result;

use super::repositories::{CommentRepository, LikeRepository, PostRepository, UserRepository};
use super::Database;
use crate::password::hash_password;

/// Demo accounts created by [`seed_demo_data`]: (username, password)
pub const DEMO_USERS: [(&str, &str); 2] = [("jack", "blackpearl1"), ("sparrow", "tortuga123")];

/// Populate an empty database with a couple of users, posts, comments and likes.
///
/// Does nothing if the first demo user already exists.
pub fn seed_demo_data(db: &Database) -> Result<()> {
    let users = UserRepository::new(db.pool.clone());
    if users.username_exists(DEMO_USERS[0].0)? {
        tracing::debug!("Demo data already present");
        return Ok(());
    }

    let posts = PostRepository::new(db.pool.clone());
    let comments = CommentRepository::new(db.pool.clone());
    let likes = LikeRepository::new(db.pool.clone());

    let jack = users.create(DEMO_USERS[0].0, &hash_password(DEMO_USERS[0].1))?;
    let sparrow = users.create(DEMO_USERS[1].0, &hash_password(DEMO_USERS[1].1))?;

    let strong = posts.create(
        jack.id,
        "Strong Post",
        "These are strong words of the strong post.",
    )?;
    let new = posts.create(sparrow.id, "New Post", "This is the new post.")?;

    comments.create(strong, sparrow.id, "Keep it up!")?;
    comments.create(new, jack.id, "Good job!")?;
    likes.create(strong, sparrow.id)?;
    likes.create(new, jack.id)?;

    tracing::info!("Seeded demo data");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_idempotent() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        seed_demo_data(&db).expect("First seed failed");
        seed_demo_data(&db).expect("Second seed failed");

        let posts = PostRepository::new(db.pool.clone());
        assert_eq!(posts.count().unwrap(), 2);

        let newest = &posts.list_page(None, 0, 1).unwrap()[0];
        assert_eq!(newest.title, "New Post");
        assert_eq!(newest.comments_count, 1);
        assert_eq!(newest.likes_count, 1);
    }
}

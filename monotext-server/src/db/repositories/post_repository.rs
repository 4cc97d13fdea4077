use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use monotext_types::Post;

use crate::db::{now, timestamp_column, to_db_timestamp, DbPool};

/// Columns shared by every post query. `?1` is the viewing user (or NULL),
/// used to fill in `liked`.
const POST_SELECT: &str = "SELECT p.id, p.owner_id, u.username, p.title, p.text, p.created_at, p.updated_at,
        (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
        CASE WHEN ?1 IS NULL THEN NULL
             ELSE EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.owner_id = ?1)
        END AS liked
     FROM posts p
     JOIN users u ON p.owner_id = u.id";

/// Title-or-text substring filter bound to the numbered parameter `param`
fn search_filter(param: &str) -> String {
    format!(
        "(p.title LIKE {0} ESCAPE '\\' OR p.text LIKE {0} ESCAPE '\\')",
        param
    )
}

fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        owner_username: row.get(2)?,
        title: row.get(3)?,
        text: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
        comments_count: row.get(7)?,
        likes_count: row.get(8)?,
        liked: row.get(9)?,
    })
}

/// Build a `LIKE` pattern matching `query` anywhere, with wildcards escaped
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post and return its ID
    pub fn create(&self, owner_id: i64, title: &str, text: &str) -> Result<i64> {
        let conn = self.pool.get()?;
        let created_at = to_db_timestamp(&now());
        conn.execute(
            "INSERT INTO posts (owner_id, title, text, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
            (owner_id, title, text, &created_at, &created_at),
        )
        .context("Failed to create post")?;
        Ok(conn.last_insert_rowid())
    }

    /// Get a single post by ID
    pub fn get_by_id(&self, post_id: i64, viewer: Option<i64>) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("{} WHERE p.id = ?2", POST_SELECT),
                params![viewer, post_id],
                map_post,
            )
            .optional()?;
        Ok(post)
    }

    /// Replace title and text, bumping `updated_at`. Returns false if the post is gone.
    pub fn update(&self, post_id: i64, title: &str, text: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE posts SET title = ?, text = ?, updated_at = ? WHERE id = ?",
                (title, text, to_db_timestamp(&now()), post_id),
            )
            .context("Failed to update post")?;
        Ok(rows > 0)
    }

    /// Delete a post; comments and likes go with it
    pub fn delete(&self, post_id: i64) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM posts WHERE id = ?", [post_id])
            .context("Failed to delete post")?;
        Ok(rows > 0)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// All posts, newest first
    pub fn list_page(&self, viewer: Option<i64>, offset: u64, limit: u64) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY p.created_at DESC, p.id DESC LIMIT ?2 OFFSET ?3",
            POST_SELECT
        ))?;
        let posts = stmt
            .query_map(params![viewer, limit as i64, offset as i64], map_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Get post count for a user
    pub fn count_by_owner(&self, owner_id: i64) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE owner_id = ?",
            [owner_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Posts by a specific user, newest first
    pub fn list_by_owner_page(
        &self,
        owner_id: i64,
        viewer: Option<i64>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE p.owner_id = ?2 ORDER BY p.created_at DESC, p.id DESC LIMIT ?3 OFFSET ?4",
            POST_SELECT
        ))?;
        let posts = stmt
            .query_map(
                params![viewer, owner_id, limit as i64, offset as i64],
                map_post,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Number of posts whose title or text contains `query`
    pub fn count_search(&self, query: &str) -> Result<u64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM posts p WHERE {}", search_filter("?1")),
            [like_pattern(query)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Posts whose title or text contains `query`, newest first
    pub fn search_page(
        &self,
        query: &str,
        viewer: Option<i64>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE {} ORDER BY p.created_at DESC, p.id DESC LIMIT ?3 OFFSET ?4",
            POST_SELECT,
            search_filter("?2")
        ))?;
        let posts = stmt
            .query_map(
                params![viewer, like_pattern(query), limit as i64, offset as i64],
                map_post,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{CommentRepository, LikeRepository, UserRepository};
    use crate::db::Database;

    fn setup() -> (Database, i64, i64) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize database");
        let users = UserRepository::new(db.pool.clone());
        let jack = users.create("Jack", "hash").unwrap().id;
        let sparrow = users.create("Sparrow", "hash").unwrap().id;
        (db, jack, sparrow)
    }

    #[test]
    fn test_create_and_get_post() {
        let (db, jack, _) = setup();
        let repo = PostRepository::new(db.pool.clone());

        let id = repo
            .create(jack, "Strong Post", "These are strong words of the strong post.")
            .unwrap();
        let post = repo.get_by_id(id, None).unwrap().expect("Post should exist");

        assert_eq!(post.owner_id, jack);
        assert_eq!(post.owner_username, "Jack");
        assert_eq!(post.title, "Strong Post");
        assert_eq!(post.created_at, post.updated_at);
        assert_eq!(post.comments_count, 0);
        assert_eq!(post.likes_count, 0);
        assert!(post.liked.is_none());
    }

    #[test]
    fn test_list_page_newest_first() {
        let (db, jack, sparrow) = setup();
        let repo = PostRepository::new(db.pool.clone());
        let first = repo.create(jack, "Strong Post", "Strong words").unwrap();
        let second = repo.create(sparrow, "New Post", "This is the new post.").unwrap();

        let posts = repo.list_page(None, 0, 10).unwrap();
        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second, first]);
        assert_eq!(repo.count().unwrap(), 2);

        let tail = repo.list_page(None, 1, 10).unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].id, first);
    }

    #[test]
    fn test_counts_and_liked_flag() {
        let (db, jack, sparrow) = setup();
        let repo = PostRepository::new(db.pool.clone());
        let comments = CommentRepository::new(db.pool.clone());
        let likes = LikeRepository::new(db.pool.clone());

        let id = repo.create(jack, "Strong Post", "Strong words").unwrap();
        comments.create(id, sparrow, "Keep it up!").unwrap();
        likes.create(id, sparrow).unwrap();

        let seen_by_sparrow = repo.get_by_id(id, Some(sparrow)).unwrap().unwrap();
        assert_eq!(seen_by_sparrow.comments_count, 1);
        assert_eq!(seen_by_sparrow.likes_count, 1);
        assert_eq!(seen_by_sparrow.liked, Some(true));

        let seen_by_jack = repo.get_by_id(id, Some(jack)).unwrap().unwrap();
        assert_eq!(seen_by_jack.liked, Some(false));
    }

    #[test]
    fn test_update_bumps_updated_at() {
        let (db, jack, _) = setup();
        let repo = PostRepository::new(db.pool.clone());
        let id = repo.create(jack, "Strong Post", "Strong words").unwrap();
        let before = repo.get_by_id(id, None).unwrap().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(2));
        assert!(repo.update(id, "Stronger Post", "Stronger words").unwrap());

        let after = repo.get_by_id(id, None).unwrap().unwrap();
        assert_eq!(after.title, "Stronger Post");
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);
        assert!(!repo.update(999, "x", "yy").unwrap());
    }

    #[test]
    fn test_delete_cascades() {
        let (db, jack, sparrow) = setup();
        let repo = PostRepository::new(db.pool.clone());
        let comments = CommentRepository::new(db.pool.clone());
        let likes = LikeRepository::new(db.pool.clone());

        let id = repo.create(jack, "Strong Post", "Strong words").unwrap();
        comments.create(id, sparrow, "Keep it up!").unwrap();
        likes.create(id, sparrow).unwrap();

        assert!(repo.delete(id).unwrap());
        assert!(repo.get_by_id(id, None).unwrap().is_none());
        assert_eq!(comments.count_for_post(id).unwrap(), 0);
        assert_eq!(likes.count_for_post(id).unwrap(), 0);
        assert!(!repo.delete(id).unwrap());
    }

    #[test]
    fn test_owner_listing() {
        let (db, jack, sparrow) = setup();
        let repo = PostRepository::new(db.pool.clone());
        repo.create(jack, "One", "first post").unwrap();
        repo.create(sparrow, "Two", "second post").unwrap();
        let third = repo.create(jack, "Three", "third post").unwrap();

        assert_eq!(repo.count_by_owner(jack).unwrap(), 2);
        let posts = repo.list_by_owner_page(jack, None, 0, 1).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, third);
    }

    #[test]
    fn test_search_matches_title_or_text_case_insensitively() {
        let (db, jack, _) = setup();
        let repo = PostRepository::new(db.pool.clone());
        let strong = repo.create(jack, "Strong Post", "words").unwrap();
        let new = repo.create(jack, "New Post", "This is the STRONGEST thing").unwrap();
        repo.create(jack, "Other", "nothing here").unwrap();

        assert_eq!(repo.count_search("strong").unwrap(), 2);
        let ids: Vec<i64> = repo
            .search_page("strong", None, 0, 10)
            .unwrap()
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![new, strong]);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let (db, jack, _) = setup();
        let repo = PostRepository::new(db.pool.clone());
        repo.create(jack, "Discount", "100% off").unwrap();
        repo.create(jack, "Plain", "100 percent").unwrap();

        assert_eq!(repo.count_search("100%").unwrap(), 1);
        assert_eq!(repo.count_search("_").unwrap(), 0);
    }

    #[test]
    fn test_like_pattern() {
        assert_eq!(like_pattern("abc"), "%abc%");
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }
}

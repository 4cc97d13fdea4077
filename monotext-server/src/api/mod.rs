pub mod accounts;
pub mod comments;
pub mod error;
pub mod json;
pub mod likes;
pub mod posts;
pub mod profile;
pub mod search;

pub use error::{ApiError, ApiResult};
pub use json::ApiJson;

/// Parse a numeric path segment such as a post ID
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid {} ID", what)))
}

/// Canonical URL of a post's detail endpoint
pub fn post_detail_url(post_id: i64) -> String {
    format!("/monotext/post/{}/", post_id)
}

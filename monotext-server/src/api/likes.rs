use axum::{
    extract::{Path, State},
    Extension, Json,
};
use monotext_types::LikeStatus;

use super::{parse_id, ApiError, ApiResult};
use crate::db::repositories::{LikeRepository, PostRepository};
use crate::middleware::RequestUser;
use crate::state::AppState;

/// POST /monotext/post/:post_pk/like/ - Like the post, or take the like back
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    Path(post_pk): Path<String>,
) -> ApiResult<Json<LikeStatus>> {
    let post_id = parse_id(&post_pk, "post")?;
    let user_id = request_user.require()?;

    let pool = state.db.pool.clone();
    PostRepository::new(pool.clone())
        .get_by_id(post_id, None)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    let (liked, likes_count) = LikeRepository::new(pool).toggle(post_id, user_id)?;

    Ok(Json(LikeStatus {
        post_id,
        liked,
        likes_count,
    }))
}

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Extension, Json,
};
use monotext_types::{CommentsChunk, CreateCommentRequest, PageQuery};

use super::{parse_id, post_detail_url, ApiError, ApiJson, ApiResult};
use crate::db::repositories::{CommentRepository, PostRepository};
use crate::middleware::RequestUser;
use crate::pagination::Paginator;
use crate::state::AppState;
use crate::validation::validate_comment;

fn ensure_post_exists(state: &AppState, post_id: i64) -> ApiResult<()> {
    PostRepository::new(state.db.pool.clone())
        .get_by_id(post_id, None)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    Ok(())
}

/// GET /monotext/post/:post_pk/comments/ - One chunk of a post's comments, newest first
pub async fn get_post_comments(
    State(state): State<AppState>,
    Path(post_pk): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<CommentsChunk>> {
    let post_id = parse_id(&post_pk, "post")?;
    ensure_post_exists(&state, post_id)?;

    let repo = CommentRepository::new(state.db.pool.clone());
    let paginator = Paginator::new(
        repo.count_for_post(post_id)?,
        state.settings.pagination.comments_per_page,
    );
    let page = paginator.get_page(query.page.as_deref());
    let comments = repo.list_for_post_page(post_id, page.offset(), page.limit())?;

    Ok(Json(CommentsChunk {
        comments_chunk: comments,
        has_next: page.has_next(),
        comments_count: page.count,
        page: page.number,
        num_pages: page.num_pages,
    }))
}

/// POST /monotext/comment/:post_pk/add/ - Comment on a post, then redirect to it
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    Path(post_pk): Path<String>,
    ApiJson(payload): ApiJson<CreateCommentRequest>,
) -> ApiResult<Redirect> {
    let post_id = parse_id(&post_pk, "post")?;
    let owner_id = request_user.require()?;
    ensure_post_exists(&state, post_id)?;
    let text = validate_comment(&payload.text)?;

    let comment_id = CommentRepository::new(state.db.pool.clone()).create(post_id, owner_id, &text)?;
    tracing::debug!("User {} commented {} on post {}", owner_id, comment_id, post_id);

    Ok(Redirect::to(&post_detail_url(post_id)))
}

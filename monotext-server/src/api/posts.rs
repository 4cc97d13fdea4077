use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Extension, Json,
};
use monotext_types::{CreatePostRequest, PageQuery, Post, PostFeed, UpdatePostRequest};

use super::{parse_id, post_detail_url, ApiError, ApiJson, ApiResult};
use crate::db::repositories::PostRepository;
use crate::middleware::RequestUser;
use crate::pagination::Paginator;
use crate::state::AppState;
use crate::validation::validate_post;

/// Load a post and check that `user_id` owns it
fn owned_post(repo: &PostRepository, post_id: i64, user_id: i64) -> ApiResult<Post> {
    let post = repo
        .get_by_id(post_id, Some(user_id))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    if post.owner_id != user_id {
        return Err(ApiError::Forbidden(
            "You don't have permission to modify this post".to_string(),
        ));
    }
    Ok(post)
}

/// GET /monotext/ - All posts, newest first, one page at a time
pub async fn index(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<PostFeed>> {
    let repo = PostRepository::new(state.db.pool.clone());

    let paginator = Paginator::new(repo.count()?, state.settings.pagination.posts_per_page);
    let page = paginator.get_page(query.page.as_deref());
    let posts = repo.list_page(request_user.user_id, page.offset(), page.limit())?;

    Ok(Json(PostFeed {
        posts,
        page: page.info(),
    }))
}

/// POST /monotext/post/add/ - Create a post, then redirect to it
pub async fn create_post(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> ApiResult<Redirect> {
    let owner_id = request_user.require()?;
    let form = validate_post(payload.title.as_deref(), &payload.text)?;

    let post_id =
        PostRepository::new(state.db.pool.clone()).create(owner_id, &form.title, &form.text)?;

    tracing::info!("User {} created post {}", owner_id, post_id);
    Ok(Redirect::to(&post_detail_url(post_id)))
}

/// GET /monotext/post/:post_pk/ - A single post
pub async fn get_post(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    Path(post_pk): Path<String>,
) -> ApiResult<Json<Post>> {
    let post_id = parse_id(&post_pk, "post")?;

    let post = PostRepository::new(state.db.pool.clone())
        .get_by_id(post_id, request_user.user_id)?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

/// PUT /monotext/post/:post_pk/ - Edit your own post
pub async fn update_post(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    Path(post_pk): Path<String>,
    ApiJson(payload): ApiJson<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let post_id = parse_id(&post_pk, "post")?;
    let user_id = request_user.require()?;

    let repo = PostRepository::new(state.db.pool.clone());
    owned_post(&repo, post_id, user_id)?;

    let form = validate_post(payload.title.as_deref(), &payload.text)?;
    if !repo.update(post_id, &form.title, &form.text)? {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }

    let post = repo
        .get_by_id(post_id, Some(user_id))?
        .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))?;
    Ok(Json(post))
}

/// DELETE /monotext/post/:post_pk/ - Delete your own post with its comments and likes
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    Path(post_pk): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let post_id = parse_id(&post_pk, "post")?;
    let user_id = request_user.require()?;

    let repo = PostRepository::new(state.db.pool.clone());
    owned_post(&repo, post_id, user_id)?;
    repo.delete(post_id)?;

    tracing::info!("User {} deleted post {}", user_id, post_id);
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Post deleted successfully",
        "post_id": post_id
    })))
}

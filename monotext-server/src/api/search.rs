use axum::{
    extract::{Query, State},
    Extension, Json,
};
use monotext_types::{PostFeed, SearchQuery};

use super::ApiResult;
use crate::db::repositories::PostRepository;
use crate::middleware::RequestUser;
use crate::pagination::Paginator;
use crate::state::AppState;

/// GET /monotext/search/?q= - Posts whose title or text contains `q`
pub async fn search_posts(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<PostFeed>> {
    let per_page = state.settings.pagination.search_posts_per_page;
    let needle = query.q.trim();

    if needle.is_empty() {
        return Ok(Json(PostFeed {
            posts: Vec::new(),
            page: Paginator::new(0, per_page).page(1).info(),
        }));
    }

    let repo = PostRepository::new(state.db.pool.clone());
    let paginator = Paginator::new(repo.count_search(needle)?, per_page);
    let page = paginator.get_page(query.page.as_deref());
    let posts = repo.search_page(needle, request_user.user_id, page.offset(), page.limit())?;

    tracing::debug!("Search for {:?} matched {} posts", needle, page.count);
    Ok(Json(PostFeed {
        posts,
        page: page.info(),
    }))
}

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use crate::{
    api::{ApiError, ApiJson, ApiResult},
    db::repositories::{LikeRepository, PictureRepository, PostRepository, UserRepository},
    middleware::RequestUser,
    pagination::Paginator,
    state::AppState,
    validation::validate_picture,
};
use monotext_types::{PageQuery, ProfileView, SetPictureRequest, UserPicture};

/// GET /monotext/profile/:username/ - A user with their posts, newest first
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ProfileView>> {
    let pool = state.db.pool.clone();
    let user_repo = UserRepository::new(pool.clone());
    let post_repo = PostRepository::new(pool.clone());
    let like_repo = LikeRepository::new(pool);

    let user = user_repo
        .get_by_username(&username)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let posts_count = post_repo.count_by_owner(user.id)?;
    let likes_received = like_repo.count_received_by_user(user.id)?;

    let paginator = Paginator::new(posts_count, state.settings.pagination.profile_posts_per_page);
    let page = paginator.get_page(query.page.as_deref());
    let posts = post_repo.list_by_owner_page(
        user.id,
        request_user.user_id,
        page.offset(),
        page.limit(),
    )?;

    Ok(Json(ProfileView {
        user,
        posts_count: posts_count as i64,
        likes_received,
        posts,
        page: page.info(),
    }))
}

/// POST /monotext/profile/picture/ - Pick an avatar for the logged-in user
pub async fn set_picture(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
    ApiJson(payload): ApiJson<SetPictureRequest>,
) -> ApiResult<Json<UserPicture>> {
    let user_id = request_user.require()?;
    let picture = validate_picture(payload.picture)?;

    let saved = PictureRepository::new(state.db.pool.clone()).set(user_id, picture)?;
    tracing::debug!("User {} picked picture {}", user_id, picture);

    Ok(Json(saved))
}

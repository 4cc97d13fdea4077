use axum::{
    middleware,
    response::Redirect,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api;
use crate::middleware::user_context_middleware;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::state::AppState;

/// Build the full application router around `state`
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limits = &state.settings.rate_limit;
    let rate_limiter = RateLimiter::new(limits.max_requests, limits.window_seconds);

    Router::new()
        .route("/", get(|| async { Redirect::permanent("/monotext/") }))
        .route("/health", get(health_check))
        // Accounts
        .route("/accounts/register/", post(api::accounts::register))
        .route("/accounts/login/", post(api::accounts::login))
        .route("/accounts/logout/", post(api::accounts::logout))
        .route("/accounts/me/", get(api::accounts::me))
        // Posts
        .route("/monotext/", get(api::posts::index))
        .route("/monotext/post/add/", post(api::posts::create_post))
        .route(
            "/monotext/post/:post_pk/",
            get(api::posts::get_post)
                .put(api::posts::update_post)
                .delete(api::posts::delete_post),
        )
        .route("/monotext/post/:post_pk/like/", post(api::likes::toggle_like))
        .route("/monotext/search/", get(api::search::search_posts))
        // Comments
        .route(
            "/monotext/post/:post_pk/comments/",
            get(api::comments::get_post_comments),
        )
        .route(
            "/monotext/comment/:post_pk/add/",
            post(api::comments::create_comment),
        )
        // Profiles
        .route("/monotext/profile/picture/", post(api::profile::set_picture))
        .route("/monotext/profile/:username/", get(api::profile::get_profile))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(axum::Extension(rate_limiter))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            user_context_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}

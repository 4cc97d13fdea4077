use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use monotext_types::{FieldErrors, LoginRequest, LoginResponse, RegisterRequest, User};
use thiserror::Error;

use super::{ApiError, ApiJson, ApiResult};
use crate::db::is_constraint_violation;
use crate::db::repositories::UserRepository;
use crate::middleware::{clear_session_cookie, session_cookie, RequestUser};
use crate::password::{hash_password, verify_password};
use crate::state::AppState;
use crate::validation::validate_registration;

#[derive(Debug, Error)]
enum LoginError {
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            LoginError::Storage(e) => e.into(),
        }
    }
}

/// Check a username/password pair and return the user it belongs to
fn authenticate(state: &AppState, username: &str, password: &str) -> Result<User, LoginError> {
    let repo = UserRepository::new(state.db.pool.clone());
    let credentials = repo
        .get_credentials(username.trim())?
        .ok_or(LoginError::InvalidCredentials)?;

    match verify_password(password, &credentials.password_hash) {
        Ok(true) => {}
        Ok(false) => return Err(LoginError::InvalidCredentials),
        Err(e) => {
            tracing::error!("Stored hash for user {} is unusable: {}", credentials.user_id, e);
            return Err(LoginError::InvalidCredentials);
        }
    }

    repo.get_by_id(credentials.user_id)?
        .ok_or(LoginError::InvalidCredentials)
}

/// Open a session and build the response that hands its token to the client
fn start_session(state: &AppState, user: User, status: StatusCode) -> ApiResult<impl IntoResponse> {
    let session_token = state.session_manager.create_session(user.id)?;
    let cookie = session_cookie(&session_token, state.settings.session.lifetime_days);

    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            user,
            session_token,
        }),
    ))
}

fn username_taken() -> ApiError {
    let mut errors = FieldErrors::new();
    errors.add("username", "A user with that username already exists.");
    errors.into()
}

/// Insert the user; a concurrent registration that wins the UNIQUE race
/// is reported like any other taken username
fn create_user(repo: &UserRepository, username: &str, password: &str) -> ApiResult<User> {
    repo.create(username, &hash_password(password))
        .map_err(|err| {
            if is_constraint_violation(&err) {
                username_taken()
            } else {
                err.into()
            }
        })
}

/// POST /accounts/register/ - Create an account and log it in
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let form = validate_registration(&payload.username, &payload.password, &payload.password_confirm)?;

    let repo = UserRepository::new(state.db.pool.clone());
    if repo.username_exists(&form.username)? {
        return Err(username_taken());
    }

    let user = create_user(&repo, &form.username, &form.password)?;
    tracing::info!("Registered user {} ({})", user.username, user.id);

    start_session(&state, user, StatusCode::CREATED)
}

/// POST /accounts/login/ - Exchange credentials for a session
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = authenticate(&state, &payload.username, &payload.password)?;
    start_session(&state, user, StatusCode::OK)
}

/// POST /accounts/logout/ - End the current session
pub async fn logout(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
) -> ApiResult<impl IntoResponse> {
    request_user.require()?;
    if let Some(token) = &request_user.token {
        state.session_manager.delete_session(token)?;
    }

    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(serde_json::json!({
            "message": "Logged out successfully"
        })),
    ))
}

/// GET /accounts/me/ - The logged-in user
pub async fn me(
    State(state): State<AppState>,
    Extension(request_user): Extension<RequestUser>,
) -> ApiResult<Json<User>> {
    let user_id = request_user.require()?;
    let user = UserRepository::new(state.db.pool.clone())
        .get_by_id(user_id)?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

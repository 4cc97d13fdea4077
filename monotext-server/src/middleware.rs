use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::ApiError;
use crate::state::AppState;

/// Header carrying the session token for API clients
pub const SESSION_HEADER: &str = "X-Session-Token";
/// Cookie carrying the session token for browsers
pub const SESSION_COOKIE: &str = "monotext_session";

/// Read the session token from the header, falling back to the cookie
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers.get(SESSION_HEADER).and_then(|v| v.to_str().ok()) {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` value that stores a session token
pub fn session_cookie(token: &str, max_age_days: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age_days * 24 * 60 * 60
    )
}

/// `Set-Cookie` value that removes the session cookie
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Who is making the request, resolved once per request by [`user_context_middleware`]
#[derive(Clone, Debug, Default)]
pub struct RequestUser {
    pub user_id: Option<i64>,
    pub token: Option<String>,
}

impl RequestUser {
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// The user ID, or 401 for anonymous requests
    pub fn require(&self) -> Result<i64, ApiError> {
        self.user_id
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// Middleware that validates the session token (if any) and stores the
/// resulting [`RequestUser`] in the request extensions.
///
/// Invalid or expired tokens are treated as anonymous; handlers that need a
/// user reject the request themselves.
pub async fn user_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_user = match session_token(request.headers()) {
        Some(token) => match state.session_manager.validate_session(&token) {
            Ok(user_id) => RequestUser {
                user_id: Some(user_id),
                token: Some(token),
            },
            Err(e) => {
                tracing::debug!("Ignoring invalid session token: {}", e);
                RequestUser::unauthenticated()
            }
        },
        None => RequestUser::unauthenticated(),
    };

    request.extensions_mut().insert(request_user);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_token_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("monotext_session=def"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; monotext_session=def; other=1"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("def"));
    }

    #[test]
    fn test_missing_or_empty_token() {
        let mut headers = HeaderMap::new();
        assert!(session_token(&headers).is_none());

        headers.insert(SESSION_HEADER, HeaderValue::from_static("  "));
        headers.insert(header::COOKIE, HeaderValue::from_static("monotext_session="));
        assert!(session_token(&headers).is_none());
    }

    #[test]
    fn test_session_cookie_format() {
        let cookie = session_cookie("tok", 1);
        assert!(cookie.starts_with("monotext_session=tok;"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(clear_session_cookie().contains("Max-Age=0"));
    }

    #[test]
    fn test_request_user_require() {
        assert!(RequestUser::unauthenticated().require().is_err());

        let user = RequestUser {
            user_id: Some(7),
            token: Some("tok".to_string()),
        };
        assert!(user.is_authenticated());
        assert_eq!(user.require().unwrap(), 7);
    }
}

use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::api::ApiError;
use crate::middleware::RequestUser;

/// Entries beyond this trigger a sweep of stale windows
const SWEEP_THRESHOLD: usize = 10_000;

/// Fixed-window, in-memory rate limiter keyed by session token
#[derive(Clone)]
pub struct RateLimiter {
    // session_token -> (request_count, window_start)
    state: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_duration: Duration::from_secs(window_seconds),
        }
    }

    /// Count a request against `key`; `Err` carries the time until the window resets
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        // A poisoned lock only means another request panicked mid-update
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        if state.len() > SWEEP_THRESHOLD {
            let window = self.window_duration;
            state.retain(|_, (_, start)| now.duration_since(*start) < window * 2);
        }

        let (count, window_start) = state.entry(key.to_string()).or_insert((0, now));
        let elapsed = now.duration_since(*window_start);
        if elapsed >= self.window_duration {
            *window_start = now;
            *count = 0;
        } else if *count >= self.max_requests {
            return Err(self.window_duration - elapsed);
        }

        *count += 1;
        Ok(())
    }
}

/// Middleware that rate limits requests from logged-in sessions.
///
/// Runs inside [`crate::middleware::user_context_middleware`] so only
/// validated tokens ever get a counter.
pub async fn rate_limit_middleware(
    axum::Extension(limiter): axum::Extension<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let token = request
        .extensions()
        .get::<RequestUser>()
        .filter(|user| user.is_authenticated())
        .and_then(|user| user.token.clone());

    if let Some(token) = token {
        if let Err(retry_after) = limiter.check(&token) {
            tracing::warn!("Rate limit exceeded for a session");
            return ApiError::TooManyRequests(format!(
                "Rate limit exceeded. Try again in {} seconds.",
                retry_after.as_secs().max(1)
            ))
            .into_response();
        }
    }

    next.run(request).await
}

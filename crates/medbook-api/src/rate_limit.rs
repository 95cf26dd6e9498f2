//! Fixed-window request limiter for the protected routes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Extension, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Counts requests per wall-clock second. A limit of 0 disables limiting.
///
/// The window second and the count share one atomic word (second in the
/// high 32 bits, count in the low 32) so a window reset and an increment
/// cannot interleave.
#[derive(Clone)]
pub struct RateLimiter {
    max_per_sec: u64,
    state: Arc<AtomicU64>,
}

const COUNT_MASK: u64 = 0xFFFF_FFFF;

impl RateLimiter {
    pub fn new(max_per_sec: u64) -> Self {
        Self {
            max_per_sec: max_per_sec.min(COUNT_MASK),
            state: Arc::new(AtomicU64::new(0)),
        }
    }

    fn try_acquire(&self) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        self.try_acquire_at(now)
    }

    fn try_acquire_at(&self, second: u64) -> bool {
        if self.max_per_sec == 0 {
            return true;
        }
        let window = second & COUNT_MASK;
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let next = if current >> 32 != window {
                (window << 32) | 1
            } else if current & COUNT_MASK < self.max_per_sec {
                current + 1
            } else {
                return false;
            };
            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }
}

pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire() {
        return next.run(req).await;
    }
    tracing::warn!(path = %req.uri().path(), "Rate limit exceeded");
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "too_many_requests",
            "message": "Rate limit exceeded"
        })),
    )
        .into_response()
}

//! Per-IP rate limiting for PIN unlock routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::error::{AppError, ErrorCode};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::state::AppState;

const WINDOW_SECS: u64 = 60;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route -> (IP -> entry)
    inner: Arc<Mutex<HashMap<String, HashMap<String, IpEntry>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, route: &str, ip: &str, max_requests: u32, window_secs: u64) -> bool {
        let mut map = self.inner.lock().await;
        let route_map = map.entry(route.to_owned()).or_default();
        let now = Instant::now();

        let entry = route_map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start).as_secs() >= window_secs {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= max_requests
    }

    /// Remove entries older than 5 minutes
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let cutoff = std::time::Duration::from_secs(300);
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, entry| now.duration_since(entry.window_start) < cutoff);
        }

        map.retain(|_, route_map| !route_map.is_empty());
    }

    #[cfg(test)]
    async fn tracked_ips(&self) -> usize {
        self.inner.lock().await.values().map(HashMap::len).sum()
    }
}

/// Extract client IP: first X-Forwarded-For entry, then peer address.
fn extract_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let ip = first.trim();
        if !ip.is_empty() {
            return ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Rate limit middleware for the unlock routes
pub async fn unlock_rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_ip(&request);
    let route = request.uri().path().to_owned();
    if !state
        .rate_limiter
        .check(&route, &ip, state.unlock_limit_per_minute, WINDOW_SECS)
        .await
    {
        tracing::warn!(route = %route, ip = %ip, "Unlock rate limit exceeded");
        return AppError::new(ErrorCode::TooManyAttempts).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_limit_per_route_and_ip() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check("/api/admin/unlock", "1.1.1.1", 3, 60).await);
        }
        assert!(!limiter.check("/api/admin/unlock", "1.1.1.1", 3, 60).await);
        assert!(limiter.check("/api/admin/unlock", "2.2.2.2", 3, 60).await);
        assert!(limiter.check("/api/runner/unlock", "1.1.1.1", 3, 60).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("r", "ip", 1, 60).await);
        assert!(!limiter.check("r", "ip", 1, 60).await);
        tokio::time::advance(std::time::Duration::from_secs(61)).await;
        assert!(limiter.check("r", "ip", 1, 60).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_sweeps_stale_windows() {
        let limiter = RateLimiter::new();
        limiter.check("r", "old", 5, 60).await;
        tokio::time::advance(std::time::Duration::from_secs(301)).await;
        limiter.check("r", "fresh", 5, 60).await;

        limiter.cleanup().await;
        assert_eq!(limiter.tracked_ips().await, 1);
    }

    #[test]
    fn test_extract_ip_prefers_forwarded_for() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 172.16.0.1")
            .body(axum::body::Body::empty())
            .unwrap();
        assert_eq!(extract_ip(&request), "10.0.0.1");

        let request = axum::http::Request::builder().body(axum::body::Body::empty()).unwrap();
        assert_eq!(extract_ip(&request), "unknown");
    }
}

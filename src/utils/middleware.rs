use axum::extract::{ConnectInfo, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

static LOGIN_WINDOWS: Lazy<DashMap<String, (u32, Instant)>> = Lazy::new(DashMap::new);

static LOGIN_LIMIT: Lazy<u32> = Lazy::new(|| {
    std::env::var("RATE_LIMIT_PER_SEC")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5)
});

/// Fixed one-second window per source IP. Returns false once the window is
/// over the limit.
fn note_request(key: &str, limit: u32) -> bool {
    let now = Instant::now();
    let mut entry = LOGIN_WINDOWS.entry(key.to_string()).or_insert((0, now));
    if now.duration_since(entry.1) > Duration::from_secs(1) {
        *entry = (1, now);
    } else {
        entry.0 += 1;
    }
    entry.0 <= limit
}

/// Credential-guessing throttle for the login route.
pub async fn login_rate_limiter(request: Request, next: Next) -> Result<Response, StatusCode> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !note_request(&ip, *LOGIN_LIMIT) {
        tracing::warn!(action = "login_rate_limited", ip = %ip);
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_blocks_after_limit() {
        for _ in 0..5 {
            assert!(note_request("198.51.100.7", 5));
        }
        assert!(!note_request("198.51.100.7", 5));
    }

    #[test]
    fn windows_are_per_key() {
        assert!(!note_request("198.51.100.8", 0));
        assert!(note_request("198.51.100.9", 1));
    }
}

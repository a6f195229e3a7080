//! Rate limiting middleware for the authentication endpoints.
//!
//! Login and invitation acceptance are the only unauthenticated writes, so
//! they get a per-client limiter to blunt credential and token guessing.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, RwLock},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Type alias for the limiter used per client address.
type ClientRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across requests, keyed by client address.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<String, Arc<ClientRateLimiter>>>,
    requests_per_minute: u32,
}

impl RateLimiterState {
    /// Create a new rate limiter state with the specified limit per minute.
    pub fn new(requests_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            requests_per_minute,
        }
    }

    fn get_or_create_limiter(&self, client: &str) -> Arc<ClientRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap();
            if let Some(limiter) = limiters.get(client) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap();

        // Double-check in case another thread created it
        if let Some(limiter) = limiters.get(client) {
            return limiter.clone();
        }

        let quota = Quota::per_minute(
            NonZeroU32::new(self.requests_per_minute).unwrap_or(NonZeroU32::new(30).unwrap()),
        );
        let limiter = Arc::new(GovRateLimiter::direct(quota));
        limiters.insert(client.to_string(), limiter.clone());
        limiter
    }

    /// Check whether a request from the given client should be allowed.
    pub fn check(&self, client: &str) -> bool {
        self.get_or_create_limiter(client).check().is_ok()
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("requests_per_minute", &self.requests_per_minute)
            .field("active_limiters", &self.limiters.read().unwrap().len())
            .finish()
    }
}

/// Best-effort client key: the first X-Forwarded-For hop, if present.
fn client_key(req: &Request<Body>) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware applying the per-client limiter to authentication routes.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(rate_limiter) = &state.rate_limiter else {
        return next.run(req).await;
    };

    let client = client_key(&req);
    if !rate_limiter.check(&client) {
        tracing::warn!(client = %client, "Rate limit exceeded on auth endpoint");
        return ApiError::RateLimited.into_response();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_within_limit() {
        let state = RateLimiterState::new(10);
        for _ in 0..10 {
            assert!(state.check("10.0.0.1"));
        }
    }

    #[test]
    fn test_blocks_over_limit() {
        let state = RateLimiterState::new(3);
        for _ in 0..3 {
            assert!(state.check("10.0.0.2"));
        }
        assert!(!state.check("10.0.0.2"));
    }

    #[test]
    fn test_clients_are_independent() {
        let state = RateLimiterState::new(1);
        assert!(state.check("10.0.0.3"));
        assert!(!state.check("10.0.0.3"));
        assert!(state.check("10.0.0.4"));
    }

    #[test]
    fn test_client_key_from_forwarded_header() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "203.0.113.9");
    }

    #[test]
    fn test_client_key_fallback() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(client_key(&req), "unknown");
    }

    #[test]
    fn test_debug_format() {
        let state = RateLimiterState::new(5);
        let debug = format!("{:?}", state);
        assert!(debug.contains("requests_per_minute"));
    }
}

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{admin, auth, categories, health, invitations, tickets};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    // Auth endpoints get a per-client limiter when enabled (limit > 0)
    let rate_limiter = if config.security.auth_rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.auth_rate_limit_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        rate_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Unauthenticated routes
    let public_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/v1/invitations/:token",
            get(invitations::invitation_status),
        );

    // Credential-bearing public routes, rate-limited per client
    let auth_routes = Router::new()
        .route("/api/v1/auth/login", post(auth::login))
        .route(
            "/api/v1/auth/invitation/accept",
            post(auth::accept_invitation),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    // Routes for authenticated users (customers and staff)
    let user_routes = Router::new()
        .route("/api/v1/categories", get(categories::list_categories))
        .route(
            "/api/v1/tickets",
            post(tickets::create_ticket).get(tickets::list_tickets),
        )
        .route("/api/v1/tickets/:ticket_id", get(tickets::get_ticket))
        .route(
            "/api/v1/tickets/:ticket_id/replies",
            post(tickets::create_reply),
        )
        .route(
            "/api/v1/tickets/:ticket_id/close",
            post(tickets::close_ticket),
        )
        .route(
            "/api/v1/tickets/:ticket_id/reopen",
            post(tickets::reopen_ticket),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Staff-only routes; auth runs first (outermost layer = runs first)
    let admin_routes = Router::new()
        .route("/api/v1/admin/tickets", get(admin::list_all_tickets))
        .route("/api/v1/admin/tickets/stats", get(admin::ticket_stats))
        .route("/api/v1/admin/users/invite", post(invitations::invite_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(trace_id))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

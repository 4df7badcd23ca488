// Library exports for binary tools and tests
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use config::Config;
use middleware::{auth::require_session, rate_limit::SignInLimiter};
use services::session::SessionManager;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub sessions: Arc<SessionManager>,
    pub signin_limiter: Arc<SignInLimiter>,
    pub config: Arc<Config>,
}

pub fn router(state: AppState) -> Router {
    let guard = || from_fn_with_state(state.clone(), require_session);
    let request_id = HeaderName::from_static("x-request-id");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(cors_origin(&state.config.cors_origins));

    Router::new()
        // Health
        .route("/v1/public/health", get(routes::health::public_health))
        .route("/v1/health", get(routes::health::health).route_layer(guard()))
        // User & session
        .route("/v1/user", post(routes::auth::create_user))
        .route("/v1/user/signin", post(routes::auth::signin))
        .route("/v1/user/token/refresh", post(routes::auth::refresh_token))
        .route("/v1/user/signout", post(routes::auth::signout).route_layer(guard()))
        .route("/v1/user/me", get(routes::auth::me).route_layer(guard()))
        // Categories
        .route(
            "/v1/category",
            get(routes::categories::list_categories)
                .merge(post(routes::categories::create_category).route_layer(guard())),
        )
        .route(
            "/v1/category/{id}",
            get(routes::categories::get_category).merge(
                axum::routing::put(routes::categories::update_category)
                    .delete(routes::categories::delete_category)
                    .route_layer(guard()),
            ),
        )
        // Posts
        .route(
            "/v1/posts",
            get(routes::posts::list_posts)
                .merge(post(routes::posts::create_post).route_layer(guard())),
        )
        .route(
            "/v1/posts/{id}",
            get(routes::posts::get_post).merge(
                axum::routing::put(routes::posts::update_post)
                    .delete(routes::posts::delete_post)
                    .route_layer(guard()),
            ),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

/// An empty list allows any origin.
fn cors_origin(origins: &[String]) -> AllowOrigin {
    if origins.is_empty() {
        return AllowOrigin::any();
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {o:?}");
                None
            }
        })
        .collect();
    AllowOrigin::list(allowed)
}

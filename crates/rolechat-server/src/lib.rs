//! RoleChat HTTP server: routes, identity middleware and configuration.

pub mod api;
pub mod config;
pub mod logging;
pub mod middleware;

use api::{chat::*, health, role_reply::stream_role_reply, state::AppState};
use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;

/// Build the application router.
///
/// The streaming route is only registered when an upstream model is
/// configured.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let mut router = Router::new()
        .route("/api/health", get(health))
        .route("/api/chat/message", post(send_message))
        .route("/api/chat/topics", get(list_topics))
        .route("/api/chat/topics/{id}/messages", get(list_messages));

    if state.core.role_reply.is_some() {
        router = router.route("/api/chat/role-reply/stream", post(stream_role_reply));
    } else {
        tracing::warn!("Upstream model not configured, /api/chat/role-reply/stream disabled");
    }

    router
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(cors)
        .with_state(state)
}

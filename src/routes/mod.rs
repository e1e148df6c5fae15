use axum::{middleware, routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::metrics;
use crate::state::AppState;

pub mod messages;
pub mod users;
pub mod wsroute;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/api/v0", api_routes())
        .layer(middleware::from_fn(metrics::track_http_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/chat/:handle", get(wsroute::chat_handler))
        .route("/messages/:handle", get(messages::get_messages))
        .route("/users", get(users::list_users).post(users::create_user))
}

async fn health_check() -> &'static str {
    "OK"
}

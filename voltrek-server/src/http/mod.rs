//! HTTP Command API: one axum route per entry in spec §6.3.

mod configs;
mod error;
mod health;
mod sessions;
mod state;

pub use error::ServerError;
pub use state::AppState;

use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{BoxError, Router};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// The request's total read-plus-write budget. `tower_http` only models
/// a single whole-request timeout, not separate read/write phases, so
/// the two configured durations are combined into the one bound this
/// layer enforces; `http_idle_timeout` has no router-level equivalent
/// and is applied instead in the WebSocket handler's read loop, the one
/// place a connection can sit open indefinitely between frames.
pub fn build_router(state: AppState, read_timeout: Duration, write_timeout: Duration) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    let request_timeout = read_timeout + write_timeout;

    Router::new()
        .route("/health", get(health::health_check))
        .route("/configs", get(configs::list_configs))
        .route("/configs/:name", get(configs::get_config).post(configs::save_config))
        .route("/sessions", get(sessions::list_sessions).post(sessions::create_session))
        .route("/sessions/:id", get(sessions::get_session).delete(sessions::delete_session))
        .route("/sessions/:id/state", get(sessions::get_state))
        .route("/sessions/:id/move", post(sessions::mv))
        .route("/sessions/:id/bulk_move", post(sessions::bulk_move))
        .route("/sessions/:id/reset", post(sessions::reset))
        .route("/sessions/:id/history", get(sessions::history))
        .route("/sessions/:id/ws", get(crate::websocket::ws_handler))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_timeout_error))
                .layer(TimeoutLayer::new(request_timeout)),
        )
        .with_state(state)
}

async fn handle_timeout_error(err: BoxError) -> (StatusCode, String) {
    if err.is::<tower::timeout::error::Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, format!("unhandled internal error: {err}"))
    }
}

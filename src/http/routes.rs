use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Recording toggles
        .route(
            "/capture/microphone/toggle",
            post(handlers::toggle_microphone),
        )
        .route(
            "/capture/device-audio/toggle",
            post(handlers::toggle_device_audio),
        )
        // Status queries
        .route("/capture/status", get(handlers::get_status))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

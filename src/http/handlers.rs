use super::state::AppState;
use crate::capture::SessionKind;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::info;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    /// Which session the toggle addressed
    pub source: String,
    /// Whether that session is active after the toggle
    pub active: bool,
    /// The coordinator's current result, if any
    pub result: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /capture/microphone/toggle
/// Start or stop the microphone session
pub async fn toggle_microphone(State(state): State<AppState>) -> impl IntoResponse {
    info!("Toggling microphone recording");

    state.coordinator.toggle_microphone().await;

    (
        StatusCode::OK,
        Json(ToggleResponse {
            source: SessionKind::Microphone.label().to_string(),
            active: state.coordinator.microphone_active(),
            result: state.coordinator.current_result().await,
        }),
    )
        .into_response()
}

/// POST /capture/device-audio/toggle
/// Start or stop the device-audio session
pub async fn toggle_device_audio(State(state): State<AppState>) -> impl IntoResponse {
    info!("Toggling device audio recording");

    state.coordinator.toggle_device_audio().await;

    (
        StatusCode::OK,
        Json(ToggleResponse {
            source: SessionKind::DeviceAudio.label().to_string(),
            active: state.coordinator.device_audio_active(),
            result: state.coordinator.current_result().await,
        }),
    )
        .into_response()
}

/// GET /capture/status
/// Get both active flags and the current displayed result
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.coordinator.status().await)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

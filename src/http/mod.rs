//! HTTP API server for external control (overlay UI)
//!
//! This module provides a REST API for driving the recording coordinator:
//! - POST /capture/microphone/toggle - Toggle microphone recording
//! - POST /capture/device-audio/toggle - Toggle device audio recording
//! - GET /capture/status - Query active flags and the current result
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;

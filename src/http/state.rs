use crate::coordinator::RecordingCoordinator;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The one coordinator instance behind every route
    pub coordinator: Arc<RecordingCoordinator>,
}

impl AppState {
    pub fn new(coordinator: Arc<RecordingCoordinator>) -> Self {
        Self { coordinator }
    }
}

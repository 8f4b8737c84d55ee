//! Recording coordinator
//!
//! The presentation-facing aggregator of both capture sessions:
//! - One toggle per session identity (start when inactive, stop when active)
//! - Dispatch of every finalized payload to the transcriber
//! - A single displayed result, overwritten by whichever dispatch
//!   finishes last, success or failure

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::capture::{CaptureBackend, CaptureSession, SessionKind};
use crate::transcribe::Transcriber;

/// Fixed display message for a failed acquisition
pub fn acquisition_failure_message(kind: SessionKind) -> &'static str {
    match kind {
        SessionKind::Microphone => "Could not start recording.",
        SessionKind::DeviceAudio => "Could not start device audio recording.",
    }
}

/// Fixed display message for a failed transcription
pub fn transcription_failure_message(kind: SessionKind) -> &'static str {
    match kind {
        SessionKind::Microphone => "Audio analysis failed.",
        SessionKind::DeviceAudio => "Device audio analysis failed.",
    }
}

/// Snapshot of the coordinator's displayable state
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub microphone_active: bool,
    pub device_audio_active: bool,
    pub current_result: Option<String>,
}

pub struct RecordingCoordinator {
    microphone: CaptureSession,
    device_audio: CaptureSession,
    transcriber: Arc<dyn Transcriber>,

    /// Per-session active flags, updated when start/stop completes
    microphone_active: AtomicBool,
    device_audio_active: AtomicBool,

    /// Most recent result or failure message, last-writer-wins across
    /// both sessions
    current_result: Mutex<Option<String>>,
}

impl RecordingCoordinator {
    pub fn new(backend: Arc<dyn CaptureBackend>, transcriber: Arc<dyn Transcriber>) -> Self {
        Self {
            microphone: CaptureSession::new(SessionKind::Microphone, Arc::clone(&backend)),
            device_audio: CaptureSession::new(SessionKind::DeviceAudio, backend),
            transcriber,
            microphone_active: AtomicBool::new(false),
            device_audio_active: AtomicBool::new(false),
            current_result: Mutex::new(None),
        }
    }

    /// Toggle the microphone session
    pub async fn toggle_microphone(&self) {
        self.toggle(SessionKind::Microphone).await;
    }

    /// Toggle the device-audio session
    pub async fn toggle_device_audio(&self) {
        self.toggle(SessionKind::DeviceAudio).await;
    }

    pub fn microphone_active(&self) -> bool {
        self.microphone_active.load(Ordering::SeqCst)
    }

    pub fn device_audio_active(&self) -> bool {
        self.device_audio_active.load(Ordering::SeqCst)
    }

    /// Most recent transcription result or failure message
    pub async fn current_result(&self) -> Option<String> {
        self.current_result.lock().await.clone()
    }

    pub async fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            microphone_active: self.microphone_active(),
            device_audio_active: self.device_audio_active(),
            current_result: self.current_result().await,
        }
    }

    /// Direct access to the underlying sessions, for callers that need
    /// lifecycle phases rather than the boolean toggle state
    pub fn microphone(&self) -> &CaptureSession {
        &self.microphone
    }

    pub fn device_audio(&self) -> &CaptureSession {
        &self.device_audio
    }

    async fn toggle(&self, kind: SessionKind) {
        let (session, active) = match kind {
            SessionKind::Microphone => (&self.microphone, &self.microphone_active),
            SessionKind::DeviceAudio => (&self.device_audio, &self.device_audio_active),
        };

        if !active.load(Ordering::SeqCst) {
            match session.start().await {
                Ok(()) => {
                    active.store(true, Ordering::SeqCst);
                }
                Err(e) => {
                    warn!("{} could not be started: {}", kind.label(), e);
                    self.set_result(acquisition_failure_message(kind)).await;
                }
            }
            return;
        }

        let payload = session.stop().await;
        active.store(false, Ordering::SeqCst);

        // The session is idle again; the dispatch outcome only affects the
        // displayed result
        if let Some(payload) = payload {
            match self.transcriber.transcribe(&payload).await {
                Ok(text) => {
                    info!("{} transcription complete ({} chars)", kind.label(), text.len());
                    self.set_result(text).await;
                }
                Err(e) => {
                    error!("{} transcription failed: {}", kind.label(), e);
                    self.set_result(transcription_failure_message(kind)).await;
                }
            }
        }
    }

    async fn set_result(&self, text: impl Into<String>) {
        let mut current = self.current_result.lock().await;
        *current = Some(text.into());
    }
}

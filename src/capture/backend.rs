use anyhow::Result;
use tokio::sync::mpsc;

/// A single streamed media fragment, tagged with its media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaChunk {
    /// Raw fragment bytes, opaque to the pipeline
    pub data: Vec<u8>,
    /// Media type of this fragment (e.g. "audio/webm"); may be empty
    /// when the source does not report one
    pub mime_type: String,
}

impl MediaChunk {
    pub fn new(data: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Typed stream request descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRequest {
    /// Local microphone input
    Microphone,
    /// System/device audio, constrained to a previously enumerated source
    DeviceAudio { source_id: String },
}

/// An enumerable system capture source (screen, window, loopback device)
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CaptureSource {
    /// Stable identifier usable in a `StreamRequest`
    pub id: String,
    /// Human-readable source name
    pub name: String,
}

/// Acquisition failure
#[derive(Debug)]
pub enum AcquireError {
    /// The platform denied access to the requested device
    PermissionDenied(String),
    /// Source enumeration came back empty
    NoSourcesAvailable,
    /// The device exists but cannot satisfy the requested constraints
    UnsupportedConstraint(String),
    /// Any other backend/device error
    Backend(String),
}

impl std::fmt::Display for AcquireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcquireError::PermissionDenied(detail) => {
                write!(f, "capture permission denied: {}", detail)
            }
            AcquireError::NoSourcesAvailable => write!(f, "no capture sources available"),
            AcquireError::UnsupportedConstraint(detail) => {
                write!(f, "unsupported capture constraint: {}", detail)
            }
            AcquireError::Backend(detail) => write!(f, "capture backend error: {}", detail),
        }
    }
}

impl std::error::Error for AcquireError {}

/// A live, exclusively owned media stream
///
/// Fragments arrive on `chunks` in source-delivery order. The channel is
/// closed only after the handle's `stop()` has resolved; no fragment is
/// delivered after the close.
pub struct AcquiredStream {
    pub chunks: mpsc::Receiver<MediaChunk>,
    pub handle: Box<dyn StreamHandle>,
}

/// Control handle for an acquired stream
#[async_trait::async_trait]
pub trait StreamHandle: Send {
    /// Signal the source to halt and release the underlying device.
    ///
    /// Resolves once the source has fully stopped; the fragment channel is
    /// closed before this returns.
    async fn stop(self: Box<Self>) -> Result<()>;
}

/// Capture backend trait
///
/// Implementations:
/// - Native: cpal microphone + loopback devices (all desktop platforms)
/// - Scripted: preloaded fragment replay (for testing/batch processing)
#[async_trait::async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Enumerate device-audio capture sources, in platform order
    async fn list_sources(&self) -> Result<Vec<CaptureSource>, AcquireError>;

    /// Acquire a live stream for the request
    ///
    /// Acquiring is externally observable (device indicator); the returned
    /// handle must be stopped to release the device.
    async fn acquire(&self, request: StreamRequest) -> Result<AcquiredStream, AcquireError>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Configuration for capture backends
#[derive(Debug, Clone)]
pub struct CaptureBackendConfig {
    /// Target sample rate for PCM fragments (will downsample if needed)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono, 2 = stereo)
    pub target_channels: u16,
    /// Fragment cadence in milliseconds
    pub chunk_duration_ms: u64,
    /// Capacity of the fragment channel
    pub channel_capacity: usize,
}

impl Default for CaptureBackendConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz for speech models
            target_channels: 1,        // Mono
            chunk_duration_ms: 250,    // 250ms fragments
            channel_capacity: 100,
        }
    }
}

/// Capture backend factory
pub struct CaptureBackendFactory;

impl CaptureBackendFactory {
    /// Create the platform capture backend
    pub fn create(config: CaptureBackendConfig) -> Result<Box<dyn CaptureBackend>> {
        use super::native::NativeBackend;
        Ok(Box::new(NativeBackend::new(config)))
    }
}

use super::backend::{AcquireError, AcquiredStream, CaptureBackend, MediaChunk, StreamHandle, StreamRequest};
use super::payload::{finalize, EncodedPayload};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Identity of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    /// Local microphone input
    Microphone,
    /// System/device audio
    DeviceAudio,
}

impl SessionKind {
    pub fn label(&self) -> &'static str {
        match self {
            SessionKind::Microphone => "microphone",
            SessionKind::DeviceAudio => "device audio",
        }
    }
}

/// Observable lifecycle phase of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Acquiring,
    Recording,
    Stopping,
}

/// Internal phase, carrying the resources owned while recording
enum Inner {
    Idle,
    Acquiring,
    Recording {
        handle: Box<dyn StreamHandle>,
        pump: JoinHandle<()>,
    },
    Stopping,
}

impl Inner {
    fn phase(&self) -> SessionPhase {
        match self {
            Inner::Idle => SessionPhase::Idle,
            Inner::Acquiring => SessionPhase::Acquiring,
            Inner::Recording { .. } => SessionPhase::Recording,
            Inner::Stopping => SessionPhase::Stopping,
        }
    }
}

/// Ordered fragment accumulation for one active recording
///
/// The session's media type is fixed by the first fragment that carries one;
/// sources that report an empty type leave it unset.
#[derive(Default)]
struct ChunkBuffer {
    fragments: Vec<Vec<u8>>,
    mime_type: Option<String>,
}

impl ChunkBuffer {
    fn append(&mut self, chunk: MediaChunk) {
        if self.mime_type.is_none() && !chunk.mime_type.is_empty() {
            self.mime_type = Some(chunk.mime_type);
        }
        self.fragments.push(chunk.data);
    }

    /// Hand off the buffered fragments, leaving the buffer empty
    fn take(&mut self) -> (Vec<Vec<u8>>, Option<String>) {
        (std::mem::take(&mut self.fragments), self.mime_type.take())
    }
}

/// Lifecycle manager for one audio source
///
/// `Idle → Acquiring → Recording → Stopping → Idle`; acquisition failure
/// drops straight back to `Idle`. At most one stream is open per session at
/// any time, and it is always released before the session re-enters `Idle`.
pub struct CaptureSession {
    kind: SessionKind,
    backend: Arc<dyn CaptureBackend>,
    inner: Mutex<Inner>,
    buffer: Arc<Mutex<ChunkBuffer>>,
}

impl CaptureSession {
    pub fn new(kind: SessionKind, backend: Arc<dyn CaptureBackend>) -> Self {
        Self {
            kind,
            backend,
            inner: Mutex::new(Inner::Idle),
            buffer: Arc::new(Mutex::new(ChunkBuffer::default())),
        }
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase()
    }

    /// Start recording
    ///
    /// No-op unless the session is `Idle`. For a device-audio session the
    /// available sources are enumerated first and the first entry selected.
    /// On acquisition failure the session returns to `Idle` with no stream
    /// left open and the error is propagated to the caller.
    pub async fn start(&self) -> Result<(), AcquireError> {
        {
            let mut inner = self.inner.lock().await;
            match *inner {
                Inner::Idle => *inner = Inner::Acquiring,
                _ => {
                    debug!("{} start ignored: session not idle", self.kind.label());
                    return Ok(());
                }
            }
        }

        let request = match self.kind {
            SessionKind::Microphone => StreamRequest::Microphone,
            SessionKind::DeviceAudio => match self.default_device_request().await {
                Ok(request) => request,
                Err(e) => {
                    warn!("{} source enumeration failed: {}", self.kind.label(), e);
                    self.reset_to_idle().await;
                    return Err(e);
                }
            },
        };

        let AcquiredStream { mut chunks, handle } = match self.backend.acquire(request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("{} acquisition failed: {}", self.kind.label(), e);
                self.reset_to_idle().await;
                return Err(e);
            }
        };

        // Pump arriving fragments into the buffer until the stream closes
        let buffer = Arc::clone(&self.buffer);
        let label = self.kind.label();
        let pump = tokio::spawn(async move {
            while let Some(chunk) = chunks.recv().await {
                let mut buffer = buffer.lock().await;
                buffer.append(chunk);
            }
            debug!("{} fragment stream closed", label);
        });

        {
            let mut inner = self.inner.lock().await;
            *inner = Inner::Recording { handle, pump };
        }

        info!("{} recording started", self.kind.label());
        Ok(())
    }

    /// Stop recording and finalize the captured fragments
    ///
    /// No-op (returns `None`) unless the session is `Recording`. The stream
    /// is released before the buffer is read; the buffer is handed to the
    /// finalizer and cleared exactly once per successful stop.
    pub async fn stop(&self) -> Option<EncodedPayload> {
        let (handle, pump) = {
            let mut inner = self.inner.lock().await;
            match std::mem::replace(&mut *inner, Inner::Stopping) {
                Inner::Recording { handle, pump } => (handle, pump),
                other => {
                    debug!("{} stop ignored: session not recording", self.kind.label());
                    *inner = other;
                    return None;
                }
            }
        };

        // Release the device even if the stop itself reports an error
        if let Err(e) = handle.stop().await {
            warn!("{} stream did not stop cleanly: {}", self.kind.label(), e);
        }

        // The sender side is closed now; draining the pump picks up every
        // fragment that was delivered before the stop
        if let Err(e) = pump.await {
            error!("{} fragment pump failed: {}", self.kind.label(), e);
        }

        let (fragments, mime_type) = {
            let mut buffer = self.buffer.lock().await;
            buffer.take()
        };
        let fragment_count = fragments.len();
        let payload = finalize(fragments, mime_type);

        {
            let mut inner = self.inner.lock().await;
            *inner = Inner::Idle;
        }

        info!(
            "{} recording stopped ({} fragments, type {})",
            self.kind.label(),
            fragment_count,
            payload.mime_type
        );
        Some(payload)
    }

    /// Enumerate device-audio sources and select the default (first) one
    async fn default_device_request(&self) -> Result<StreamRequest, AcquireError> {
        let sources = self.backend.list_sources().await?;
        let source = sources.into_iter().next().ok_or(AcquireError::NoSourcesAvailable)?;
        info!(
            "{} selected capture source: {} ({})",
            self.kind.label(),
            source.name,
            source.id
        );
        Ok(StreamRequest::DeviceAudio { source_id: source.id })
    }

    async fn reset_to_idle(&self) {
        let mut inner = self.inner.lock().await;
        *inner = Inner::Idle;
    }
}

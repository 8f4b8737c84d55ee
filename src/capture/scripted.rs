// Deterministic capture backend for testing and batch replay
//
// Replays a preloaded fragment script on every acquisition instead of
// opening a real device. Records the requests it sees, counts
// acquisitions, and tracks open handles so callers can assert release.

use anyhow::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

use super::backend::{
    AcquireError, AcquiredStream, CaptureBackend, CaptureSource, MediaChunk, StreamHandle,
    StreamRequest,
};

#[derive(Default)]
pub struct ScriptedBackend {
    sources: Vec<CaptureSource>,
    script: Vec<MediaChunk>,
    deny: Option<String>,
    acquire_delay: Option<Duration>,
    acquires: AtomicUsize,
    open_streams: Arc<AtomicUsize>,
    requests: Mutex<Vec<StreamRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources returned by `list_sources`, in order
    pub fn with_sources(mut self, sources: Vec<CaptureSource>) -> Self {
        self.sources = sources;
        self
    }

    /// Fragments delivered on every acquired stream, in order
    pub fn with_script(mut self, script: Vec<MediaChunk>) -> Self {
        self.script = script;
        self
    }

    /// Make every acquisition fail with a permission error
    pub fn deny_acquisition(mut self, reason: impl Into<String>) -> Self {
        self.deny = Some(reason.into());
        self
    }

    /// Suspend inside `acquire` before resolving
    pub fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = Some(delay);
        self
    }

    /// Number of acquisitions attempted so far
    pub fn acquire_count(&self) -> usize {
        self.acquires.load(Ordering::SeqCst)
    }

    /// Number of acquired streams not yet stopped
    pub fn open_stream_count(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    /// Every request passed to `acquire`, in call order
    pub fn requests(&self) -> Vec<StreamRequest> {
        match self.requests.lock() {
            Ok(requests) => requests.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for ScriptedBackend {
    async fn list_sources(&self) -> Result<Vec<CaptureSource>, AcquireError> {
        Ok(self.sources.clone())
    }

    async fn acquire(&self, request: StreamRequest) -> Result<AcquiredStream, AcquireError> {
        if let Some(delay) = self.acquire_delay {
            tokio::time::sleep(delay).await;
        }

        self.acquires.fetch_add(1, Ordering::SeqCst);
        match self.requests.lock() {
            Ok(mut requests) => requests.push(request),
            Err(poisoned) => poisoned.into_inner().push(request),
        }

        if let Some(reason) = &self.deny {
            return Err(AcquireError::PermissionDenied(reason.clone()));
        }

        let (tx, rx) = mpsc::channel(self.script.len() + 1);
        for chunk in &self.script {
            // Capacity covers the whole script, so this cannot fail
            let _ = tx.try_send(chunk.clone());
        }

        self.open_streams.fetch_add(1, Ordering::SeqCst);
        debug!("Scripted stream acquired ({} fragments queued)", self.script.len());

        Ok(AcquiredStream {
            chunks: rx,
            handle: Box::new(ScriptedStreamHandle {
                _tx: tx,
                open_streams: Arc::clone(&self.open_streams),
            }),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Closing the held sender is the "fully stopped" signal
struct ScriptedStreamHandle {
    _tx: mpsc::Sender<MediaChunk>,
    open_streams: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl StreamHandle for ScriptedStreamHandle {
    async fn stop(self: Box<Self>) -> Result<()> {
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
        // Dropping self drops the sender and closes the fragment channel
        Ok(())
    }
}

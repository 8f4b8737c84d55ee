//! Dual-source audio capture pipeline
//!
//! This module provides the capture side of the assistant:
//! - Backend traits for device acquisition and fragment streaming
//! - The per-source `CaptureSession` lifecycle (idle/acquiring/recording/stopping)
//! - Payload finalization (concatenate, tag, base64-encode)
//! - A cpal production backend and a scripted replay backend

pub mod backend;
pub mod native;
pub mod payload;
pub mod scripted;
pub mod session;

pub use backend::{
    AcquireError, AcquiredStream, CaptureBackend, CaptureBackendConfig, CaptureBackendFactory,
    CaptureSource, MediaChunk, StreamHandle, StreamRequest,
};
pub use native::NativeBackend;
pub use payload::{finalize, EncodedPayload, DEFAULT_MIME_TYPE};
pub use scripted::ScriptedBackend;
pub use session::{CaptureSession, SessionKind, SessionPhase};

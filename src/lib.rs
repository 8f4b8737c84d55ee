pub mod capture;
pub mod config;
pub mod coordinator;
pub mod http;
pub mod transcribe;

pub use capture::{
    finalize, AcquireError, AcquiredStream, CaptureBackend, CaptureBackendConfig,
    CaptureBackendFactory, CaptureSession, CaptureSource, EncodedPayload, MediaChunk,
    NativeBackend, ScriptedBackend, SessionKind, SessionPhase, StreamHandle, StreamRequest,
    DEFAULT_MIME_TYPE,
};
pub use config::Config;
pub use coordinator::{CoordinatorStatus, RecordingCoordinator};
pub use http::{create_router, AppState};
pub use transcribe::{NatsTranscriber, TranscribeError, TranscribeReply, TranscribeRequest, Transcriber};

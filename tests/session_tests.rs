// Integration tests for the capture session state machine
//
// These tests drive sessions against the scripted backend and verify the
// lifecycle invariants: single acquisition per cycle, release before idle,
// in-order buffering, and silent no-ops for redundant calls.

use std::sync::Arc;
use std::time::Duration;

use overlay_capture::capture::{
    AcquireError, CaptureSession, CaptureSource, MediaChunk, ScriptedBackend, SessionKind,
    SessionPhase, StreamRequest, DEFAULT_MIME_TYPE,
};

fn chunk(data: &[u8], mime_type: &str) -> MediaChunk {
    MediaChunk::new(data.to_vec(), mime_type)
}

fn screen_sources() -> Vec<CaptureSource> {
    vec![
        CaptureSource {
            id: "screen-1".to_string(),
            name: "Entire Screen".to_string(),
        },
        CaptureSource {
            id: "window-2".to_string(),
            name: "Browser".to_string(),
        },
    ]
}

#[tokio::test]
async fn test_start_stop_produces_concatenated_payload() {
    let backend = Arc::new(ScriptedBackend::new().with_script(vec![
        chunk(b"abc", "audio/webm"),
        chunk(b"def", "audio/webm"),
    ]));
    let session = CaptureSession::new(SessionKind::Microphone, backend.clone());

    session.start().await.expect("start should succeed");
    assert_eq!(session.phase().await, SessionPhase::Recording);

    let payload = session.stop().await.expect("stop should finalize a payload");
    assert_eq!(payload.data, "YWJjZGVm"); // base64 of "abcdef"
    assert_eq!(payload.mime_type, "audio/webm");
    assert_eq!(session.phase().await, SessionPhase::Idle);
}

#[tokio::test]
async fn test_fragment_order_is_preserved() {
    let forward = Arc::new(ScriptedBackend::new().with_script(vec![
        chunk(b"abc", "audio/webm"),
        chunk(b"def", "audio/webm"),
    ]));
    let reversed = Arc::new(ScriptedBackend::new().with_script(vec![
        chunk(b"def", "audio/webm"),
        chunk(b"abc", "audio/webm"),
    ]));

    let first = CaptureSession::new(SessionKind::Microphone, forward);
    let second = CaptureSession::new(SessionKind::Microphone, reversed);

    first.start().await.expect("start should succeed");
    second.start().await.expect("start should succeed");

    let first_payload = first.stop().await.expect("payload expected");
    let second_payload = second.stop().await.expect("payload expected");

    assert_ne!(first_payload.data, second_payload.data);
}

#[tokio::test]
async fn test_media_type_fixed_by_first_typed_fragment() {
    // The source's overall type is the first reported one; an empty type
    // counts as unset
    let backend = Arc::new(ScriptedBackend::new().with_script(vec![
        chunk(b"a", ""),
        chunk(b"b", "audio/ogg"),
        chunk(b"c", "audio/webm"),
    ]));
    let session = CaptureSession::new(SessionKind::Microphone, backend);

    session.start().await.expect("start should succeed");
    let payload = session.stop().await.expect("payload expected");

    assert_eq!(payload.mime_type, "audio/ogg");
}

#[tokio::test]
async fn test_stop_before_any_fragment_uses_default_type() {
    let backend = Arc::new(ScriptedBackend::new());
    let session = CaptureSession::new(SessionKind::Microphone, backend);

    session.start().await.expect("start should succeed");
    let payload = session.stop().await.expect("payload expected");

    assert_eq!(payload.data, "");
    assert_eq!(payload.mime_type, DEFAULT_MIME_TYPE);
}

#[tokio::test]
async fn test_stop_when_idle_is_a_noop() {
    let backend = Arc::new(ScriptedBackend::new());
    let session = CaptureSession::new(SessionKind::Microphone, backend.clone());

    assert!(session.stop().await.is_none());
    assert_eq!(session.phase().await, SessionPhase::Idle);
    assert_eq!(backend.acquire_count(), 0);
}

#[tokio::test]
async fn test_stop_while_acquiring_is_a_noop() {
    let backend = Arc::new(
        ScriptedBackend::new().with_acquire_delay(Duration::from_millis(50)),
    );
    let session = CaptureSession::new(SessionKind::Microphone, backend.clone());

    // The stop lands while the start is still waiting on acquisition
    let (started, stopped) = tokio::join!(session.start(), session.stop());
    started.expect("start should succeed");
    assert!(stopped.is_none());

    // The acquisition was not cancelled
    assert_eq!(session.phase().await, SessionPhase::Recording);

    session.stop().await.expect("payload expected");
    assert_eq!(backend.open_stream_count(), 0);
}

#[tokio::test]
async fn test_double_start_acquires_a_single_stream() {
    let backend = Arc::new(
        ScriptedBackend::new().with_acquire_delay(Duration::from_millis(50)),
    );
    let session = CaptureSession::new(SessionKind::Microphone, backend.clone());

    // Second start lands while the first is still acquiring
    let (first, second) = tokio::join!(session.start(), session.start());
    first.expect("first start should succeed");
    second.expect("redundant start should be a silent no-op");

    assert_eq!(backend.acquire_count(), 1);
    assert_eq!(session.phase().await, SessionPhase::Recording);

    session.stop().await.expect("payload expected");
    assert_eq!(backend.open_stream_count(), 0);
}

#[tokio::test]
async fn test_acquisition_failure_returns_session_to_idle() {
    let backend = Arc::new(ScriptedBackend::new().deny_acquisition("permission denied"));
    let session = CaptureSession::new(SessionKind::Microphone, backend.clone());

    let err = session.start().await.expect_err("start should fail");
    assert!(matches!(err, AcquireError::PermissionDenied(_)));

    assert_eq!(session.phase().await, SessionPhase::Idle);
    assert_eq!(backend.open_stream_count(), 0);

    // No finalization happened: there was never a buffer to hand off
    assert!(session.stop().await.is_none());
    assert_eq!(session.phase().await, SessionPhase::Idle);
}

#[tokio::test]
async fn test_stream_released_after_stop() {
    let backend = Arc::new(ScriptedBackend::new().with_script(vec![chunk(b"x", "audio/webm")]));
    let session = CaptureSession::new(SessionKind::Microphone, backend.clone());

    session.start().await.expect("start should succeed");
    assert_eq!(backend.open_stream_count(), 1);

    session.stop().await.expect("payload expected");
    assert_eq!(backend.open_stream_count(), 0);
}

#[tokio::test]
async fn test_device_session_selects_first_enumerated_source() {
    let backend = Arc::new(ScriptedBackend::new().with_sources(screen_sources()));
    let session = CaptureSession::new(SessionKind::DeviceAudio, backend.clone());

    session.start().await.expect("start should succeed");

    assert_eq!(
        backend.requests(),
        vec![StreamRequest::DeviceAudio {
            source_id: "screen-1".to_string()
        }]
    );

    session.stop().await.expect("payload expected");
}

#[tokio::test]
async fn test_device_session_fails_without_sources() {
    let backend = Arc::new(ScriptedBackend::new());
    let session = CaptureSession::new(SessionKind::DeviceAudio, backend.clone());

    let err = session.start().await.expect_err("start should fail");
    assert!(matches!(err, AcquireError::NoSourcesAvailable));

    // Enumeration came back empty before anything was acquired
    assert_eq!(backend.acquire_count(), 0);
    assert_eq!(session.phase().await, SessionPhase::Idle);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let mic_backend = Arc::new(ScriptedBackend::new().with_script(vec![chunk(b"m", "audio/webm")]));
    let device_backend = Arc::new(
        ScriptedBackend::new()
            .with_sources(screen_sources())
            .with_script(vec![chunk(b"d", "audio/webm")]),
    );

    let microphone = CaptureSession::new(SessionKind::Microphone, mic_backend);
    let device = CaptureSession::new(SessionKind::DeviceAudio, device_backend.clone());

    device.start().await.expect("device start should succeed");
    microphone.start().await.expect("mic start should succeed");

    // Stopping the microphone leaves the device session untouched
    microphone.stop().await.expect("payload expected");
    assert_eq!(device.phase().await, SessionPhase::Recording);
    assert_eq!(device_backend.open_stream_count(), 1);

    let payload = device.stop().await.expect("payload expected");
    assert_eq!(payload.data, "ZA=="); // base64 of "d"
}

#[tokio::test]
async fn test_session_is_restartable_after_stop() {
    let backend = Arc::new(ScriptedBackend::new().with_script(vec![chunk(b"ab", "audio/webm")]));
    let session = CaptureSession::new(SessionKind::Microphone, backend.clone());

    for _ in 0..3 {
        session.start().await.expect("start should succeed");
        let payload = session.stop().await.expect("payload expected");
        // Each cycle sees only its own fragments; the buffer is cleared on stop
        assert_eq!(payload.data, "YWI="); // base64 of "ab"
    }

    assert_eq!(backend.acquire_count(), 3);
    assert_eq!(backend.open_stream_count(), 0);
}

// Unit tests for payload finalization
//
// These tests verify that buffered fragments are concatenated in arrival
// order, tagged with the right media type, and encoded for transport.

use base64::Engine;
use overlay_capture::capture::{finalize, DEFAULT_MIME_TYPE};

#[test]
fn test_finalize_concatenates_in_order() {
    let payload = finalize(
        vec![b"abc".to_vec(), b"def".to_vec()],
        Some("audio/webm".to_string()),
    );

    assert_eq!(payload.data, "YWJjZGVm"); // base64 of "abcdef"
    assert_eq!(payload.mime_type, "audio/webm");
}

#[test]
fn test_finalize_is_order_sensitive() {
    let forward = finalize(vec![b"abc".to_vec(), b"def".to_vec()], None);
    let reversed = finalize(vec![b"def".to_vec(), b"abc".to_vec()], None);

    assert_ne!(forward.data, reversed.data);
}

#[test]
fn test_finalize_defaults_media_type() {
    let payload = finalize(vec![b"data".to_vec()], None);

    assert_eq!(payload.mime_type, DEFAULT_MIME_TYPE);
    assert_eq!(payload.mime_type, "audio/webm");
}

#[test]
fn test_finalize_keeps_declared_media_type() {
    let payload = finalize(vec![b"data".to_vec()], Some("audio/ogg".to_string()));

    assert_eq!(payload.mime_type, "audio/ogg");
}

#[test]
fn test_finalize_empty_sequence_still_produces_payload() {
    // No fragments is not an error: the payload is empty, typed with the
    // default, and still flows to dispatch
    let payload = finalize(vec![], None);

    assert_eq!(payload.data, "");
    assert_eq!(payload.mime_type, DEFAULT_MIME_TYPE);
}

#[test]
fn test_finalize_roundtrips_binary_content() {
    let fragments = vec![vec![0u8, 255, 128], vec![1, 2, 3]];
    let payload = finalize(fragments, None);

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&payload.data)
        .expect("payload should be valid base64");
    assert_eq!(decoded, vec![0u8, 255, 128, 1, 2, 3]);
}

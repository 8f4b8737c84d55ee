use base64::Engine;
use tracing::debug;

/// Media type assumed when no fragment declared one
pub const DEFAULT_MIME_TYPE: &str = "audio/webm";

/// A finalized recording, encoded for transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Base64 encoding of the concatenated fragments
    pub data: String,
    /// Declared media type of the recording
    pub mime_type: String,
}

/// Concatenate buffered fragments into a single transport-safe payload
///
/// Fragments are joined in the order given; `declared_type` falls back to
/// [`DEFAULT_MIME_TYPE`] when unset. An empty fragment sequence produces an
/// empty payload — whether that is meaningful is the transcription
/// service's call, not ours.
pub fn finalize(fragments: Vec<Vec<u8>>, declared_type: Option<String>) -> EncodedPayload {
    let mime_type = declared_type.unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string());

    let total_bytes: usize = fragments.iter().map(|f| f.len()).sum();
    let mut raw = Vec::with_capacity(total_bytes);
    for fragment in &fragments {
        raw.extend_from_slice(fragment);
    }

    debug!(
        "Finalized payload: {} fragments, {} bytes, type {}",
        fragments.len(),
        total_bytes,
        mime_type
    );

    EncodedPayload {
        data: base64::engine::general_purpose::STANDARD.encode(&raw),
        mime_type,
    }
}

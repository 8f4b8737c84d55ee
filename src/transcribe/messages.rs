use serde::{Deserialize, Serialize};

/// Transcription request sent to the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeRequest {
    pub request_id: String,
    /// Base64-encoded audio payload
    pub audio: String,
    pub mime_type: String,
    /// RFC3339 timestamp
    pub timestamp: String,
}

/// Reply from the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeReply {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

use anyhow::{Context, Result};
use async_nats::Client;
use tracing::{info, warn};

use super::messages::{TranscribeReply, TranscribeRequest};
use crate::capture::EncodedPayload;

/// Dispatch failure
///
/// All variants are terminal: retry policy, if any, belongs to the service
/// behind the transport, not to this client.
#[derive(Debug)]
pub enum TranscribeError {
    /// The request never reached the service, or the reply never came back
    Transport(String),
    /// The service processed the request and reported a failure
    Service(String),
    /// The reply arrived but could not be understood
    MalformedReply(String),
}

impl std::fmt::Display for TranscribeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscribeError::Transport(detail) => write!(f, "transcription transport error: {}", detail),
            TranscribeError::Service(detail) => write!(f, "transcription service error: {}", detail),
            TranscribeError::MalformedReply(detail) => {
                write!(f, "malformed transcription reply: {}", detail)
            }
        }
    }
}

impl std::error::Error for TranscribeError {}

/// Transcription dispatch boundary
///
/// Implementations may suspend for a full network round trip; callers must
/// tolerate overlapping dispatches from independent sessions.
#[async_trait::async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, payload: &EncodedPayload) -> Result<String, TranscribeError>;
}

/// Request/reply transcription client over NATS
pub struct NatsTranscriber {
    client: Client,
    subject: String,
}

impl NatsTranscriber {
    /// Connect to the NATS server backing the transcription service
    pub async fn connect(url: &str, subject: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, subject })
    }
}

#[async_trait::async_trait]
impl Transcriber for NatsTranscriber {
    async fn transcribe(&self, payload: &EncodedPayload) -> Result<String, TranscribeError> {
        let request = TranscribeRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            audio: payload.data.clone(),
            mime_type: payload.mime_type.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let body = serde_json::to_vec(&request)
            .map_err(|e| TranscribeError::Transport(e.to_string()))?;

        info!(
            "Dispatching transcription request {} ({} encoded bytes, type {})",
            request.request_id,
            request.audio.len(),
            request.mime_type
        );

        let response = self
            .client
            .request(self.subject.clone(), body.into())
            .await
            .map_err(|e| {
                warn!("Transcription request {} failed: {}", request.request_id, e);
                TranscribeError::Transport(e.to_string())
            })?;

        let reply: TranscribeReply = serde_json::from_slice(&response.payload)
            .map_err(|e| TranscribeError::MalformedReply(e.to_string()))?;

        if let Some(error) = reply.error {
            return Err(TranscribeError::Service(error));
        }

        reply.text.ok_or_else(|| {
            TranscribeError::MalformedReply("reply carried neither text nor error".to_string())
        })
    }
}

pub mod client;
pub mod messages;

pub use client::{NatsTranscriber, TranscribeError, Transcriber};
pub use messages::{TranscribeReply, TranscribeRequest};

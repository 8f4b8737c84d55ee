use anyhow::Result;
use serde::Deserialize;

use crate::capture::CaptureBackendConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub transcription: TranscriptionConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptionConfig {
    pub nats_url: String,
    pub subject: String,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub chunk_duration_ms: u64,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl From<&CaptureConfig> for CaptureBackendConfig {
    fn from(config: &CaptureConfig) -> Self {
        CaptureBackendConfig {
            target_sample_rate: config.sample_rate,
            target_channels: config.channels,
            chunk_duration_ms: config.chunk_duration_ms,
            ..CaptureBackendConfig::default()
        }
    }
}

// Tests for configuration loading

use overlay_capture::capture::CaptureBackendConfig;
use overlay_capture::Config;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_config_loads_from_toml() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("overlay-capture.toml");

    fs::write(
        &path,
        r#"
[service]
name = "overlay-capture"

[service.http]
bind = "127.0.0.1"
port = 8974

[transcription]
nats_url = "nats://localhost:4222"
subject = "stt.transcribe"

[capture]
sample_rate = 16000
channels = 1
chunk_duration_ms = 250
"#,
    )
    .expect("write config");

    let base = temp_dir.path().join("overlay-capture");
    let config = Config::load(base.to_str().expect("utf-8 path")).expect("config should load");

    assert_eq!(config.service.name, "overlay-capture");
    assert_eq!(config.service.http.bind, "127.0.0.1");
    assert_eq!(config.service.http.port, 8974);
    assert_eq!(config.transcription.nats_url, "nats://localhost:4222");
    assert_eq!(config.transcription.subject, "stt.transcribe");
    assert_eq!(config.capture.sample_rate, 16000);
    assert_eq!(config.capture.channels, 1);
    assert_eq!(config.capture.chunk_duration_ms, 250);
}

#[test]
fn test_capture_config_maps_to_backend_config() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("overlay-capture.toml");

    fs::write(
        &path,
        r#"
[service]
name = "overlay-capture"

[service.http]
bind = "0.0.0.0"
port = 9000

[transcription]
nats_url = "nats://localhost:4222"
subject = "stt.transcribe"

[capture]
sample_rate = 48000
channels = 2
chunk_duration_ms = 100
"#,
    )
    .expect("write config");

    let base = temp_dir.path().join("overlay-capture");
    let config = Config::load(base.to_str().expect("utf-8 path")).expect("config should load");

    let backend_config: CaptureBackendConfig = (&config.capture).into();
    assert_eq!(backend_config.target_sample_rate, 48000);
    assert_eq!(backend_config.target_channels, 2);
    assert_eq!(backend_config.chunk_duration_ms, 100);
    // Channel capacity is not configurable; it keeps the default
    assert_eq!(
        backend_config.channel_capacity,
        CaptureBackendConfig::default().channel_capacity
    );
}

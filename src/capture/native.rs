// cpal-backed capture for microphone and loopback device audio
//
// The cpal stream is !Send, so each acquired stream lives on a dedicated
// thread that owns it. The thread converts incoming samples to i16 PCM at
// the configured target rate, emits fixed-cadence fragments over the
// stream channel, and releases the device when signalled to stop.

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::backend::{
    AcquireError, AcquiredStream, CaptureBackend, CaptureBackendConfig, CaptureSource, MediaChunk,
    StreamHandle, StreamRequest,
};

/// Platform capture backend built on cpal
///
/// Microphone requests open the default input device. Device-audio requests
/// open a loopback input (PulseAudio monitors, WASAPI "Stereo Mix" and
/// friends) selected from `list_sources`.
pub struct NativeBackend {
    config: CaptureBackendConfig,
}

impl NativeBackend {
    pub fn new(config: CaptureBackendConfig) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl CaptureBackend for NativeBackend {
    async fn list_sources(&self) -> Result<Vec<CaptureSource>, AcquireError> {
        tokio::task::spawn_blocking(|| {
            let host = cpal::default_host();
            let devices = host
                .input_devices()
                .map_err(|e| AcquireError::Backend(e.to_string()))?;

            let mut sources = Vec::new();
            for (index, device) in devices.enumerate() {
                let name = device.name().unwrap_or_else(|_| format!("Input {}", index));
                if is_loopback_name(&name) {
                    sources.push(CaptureSource {
                        id: source_id_for(index, &name),
                        name,
                    });
                }
            }
            Ok(sources)
        })
        .await
        .map_err(|e| AcquireError::Backend(e.to_string()))?
    }

    async fn acquire(&self, request: StreamRequest) -> Result<AcquiredStream, AcquireError> {
        let (chunk_tx, chunk_rx) = mpsc::channel(self.config.channel_capacity);
        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<(), AcquireError>>();

        let config = self.config.clone();
        let join = std::thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || capture_thread(request, config, chunk_tx, stop_rx, ready_tx))
            .map_err(|e| AcquireError::Backend(e.to_string()))?;

        // Wait for the stream to come up without blocking the runtime
        let ready = tokio::task::spawn_blocking(move || ready_rx.recv())
            .await
            .map_err(|e| AcquireError::Backend(e.to_string()))?
            .map_err(|_| AcquireError::Backend("capture thread exited before startup".to_string()))?;
        ready?;

        Ok(AcquiredStream {
            chunks: chunk_rx,
            handle: Box::new(NativeStreamHandle { stop_tx, join }),
        })
    }

    fn name(&self) -> &str {
        "native-cpal"
    }
}

/// Control handle for a thread-owned cpal stream
struct NativeStreamHandle {
    stop_tx: std::sync::mpsc::Sender<()>,
    join: std::thread::JoinHandle<()>,
}

#[async_trait::async_trait]
impl StreamHandle for NativeStreamHandle {
    async fn stop(self: Box<Self>) -> Result<()> {
        let NativeStreamHandle { stop_tx, join } = *self;
        // A dead thread means the stream is already released
        let _ = stop_tx.send(());
        tokio::task::spawn_blocking(move || join.join())
            .await
            .context("capture thread join task failed")?
            .map_err(|_| anyhow::anyhow!("capture thread panicked"))?;
        Ok(())
    }
}

fn capture_thread(
    request: StreamRequest,
    config: CaptureBackendConfig,
    chunk_tx: mpsc::Sender<MediaChunk>,
    stop_rx: std::sync::mpsc::Receiver<()>,
    ready_tx: std::sync::mpsc::Sender<Result<(), AcquireError>>,
) {
    match open_stream(&request, &config, chunk_tx) {
        Ok((stream, accumulator)) => {
            let _ = ready_tx.send(Ok(()));

            // Parked until the handle signals stop (or is dropped)
            let _ = stop_rx.recv();

            // Dropping the stream releases the device; no callback runs after this
            drop(stream);

            let mut accumulator = match accumulator.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            accumulator.flush();
            // Dropping the accumulator drops the last sender and closes the channel
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
        }
    }
}

fn open_stream(
    request: &StreamRequest,
    config: &CaptureBackendConfig,
    chunk_tx: mpsc::Sender<MediaChunk>,
) -> Result<(cpal::Stream, Arc<Mutex<PcmAccumulator>>), AcquireError> {
    let device = resolve_device(request)?;
    let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

    let supported = device
        .default_input_config()
        .map_err(|e| AcquireError::Backend(e.to_string()))?;
    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();

    let device_rate = stream_config.sample_rate.0;
    let device_channels = stream_config.channels as usize;

    // Decimation resampling, same scheme the whole pipeline assumes:
    // integer step, never upsample
    let step = if device_rate > config.target_sample_rate {
        (device_rate / config.target_sample_rate).max(1) as usize
    } else {
        1
    };
    let effective_rate = device_rate / step as u32;

    let fold_mono = config.target_channels == 1 && device_channels > 1;
    let out_channels = if fold_mono { 1 } else { device_channels };

    let chunk_bytes =
        ((effective_rate as u64 * out_channels as u64 * 2 * config.chunk_duration_ms) / 1000).max(2)
            as usize;
    let mime_type = format!("audio/pcm;rate={};channels={}", effective_rate, out_channels);

    info!(
        "Opening capture stream on {} ({}Hz {}ch -> {}Hz {}ch, {:?})",
        device_name, device_rate, device_channels, effective_rate, out_channels, sample_format
    );

    let accumulator = Arc::new(Mutex::new(PcmAccumulator {
        pending: Vec::new(),
        chunk_bytes,
        step,
        phase: 0,
        fold_mono,
        mime_type,
        tx: chunk_tx,
    }));

    let err_fn = |err: cpal::StreamError| warn!("capture stream error: {}", err);

    let stream = match sample_format {
        cpal::SampleFormat::F32 => {
            let accumulator = Arc::clone(&accumulator);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut acc) = accumulator.lock() {
                        acc.push_frames_f32(data, device_channels);
                    }
                },
                err_fn,
                None,
            )
        }
        cpal::SampleFormat::I16 => {
            let accumulator = Arc::clone(&accumulator);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if let Ok(mut acc) = accumulator.lock() {
                        acc.push_frames_i16(data, device_channels);
                    }
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(AcquireError::UnsupportedConstraint(format!(
                "sample format {:?}",
                other
            )))
        }
    }
    .map_err(map_build_error)?;

    stream
        .play()
        .map_err(|e| AcquireError::Backend(e.to_string()))?;

    Ok((stream, accumulator))
}

fn resolve_device(request: &StreamRequest) -> Result<cpal::Device, AcquireError> {
    let host = cpal::default_host();
    match request {
        StreamRequest::Microphone => host
            .default_input_device()
            .ok_or(AcquireError::NoSourcesAvailable),
        StreamRequest::DeviceAudio { source_id } => {
            let devices = host
                .input_devices()
                .map_err(|e| AcquireError::Backend(e.to_string()))?;
            for (index, device) in devices.enumerate() {
                let name = device.name().unwrap_or_else(|_| format!("Input {}", index));
                if *source_id == source_id_for(index, &name) {
                    return Ok(device);
                }
            }
            Err(AcquireError::Backend(format!(
                "capture source {} not found",
                source_id
            )))
        }
    }
}

fn map_build_error(e: cpal::BuildStreamError) -> AcquireError {
    match e {
        cpal::BuildStreamError::StreamConfigNotSupported => {
            AcquireError::UnsupportedConstraint("stream config not supported".to_string())
        }
        other => AcquireError::Backend(other.to_string()),
    }
}

fn source_id_for(index: usize, name: &str) -> String {
    format!("input-{}-{}", index, name)
}

/// Input names that expose system playback as a capture source
fn is_loopback_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.contains("monitor") || lower.contains("loopback") || lower.contains("stereo mix")
}

/// Converts raw callback samples into fixed-size PCM fragments
struct PcmAccumulator {
    pending: Vec<u8>,
    chunk_bytes: usize,
    /// Keep one frame in `step`, drop the rest
    step: usize,
    phase: usize,
    fold_mono: bool,
    mime_type: String,
    tx: mpsc::Sender<MediaChunk>,
}

impl PcmAccumulator {
    fn push_frames_f32(&mut self, data: &[f32], channels: usize) {
        for frame in data.chunks_exact(channels.max(1)) {
            if !self.keep_frame() {
                continue;
            }
            if self.fold_mono {
                let sum: f32 = frame.iter().sum();
                self.push_sample(f32_to_i16(sum));
            } else {
                for &sample in frame {
                    self.push_sample(f32_to_i16(sample));
                }
            }
        }
        self.drain_full_chunks();
    }

    fn push_frames_i16(&mut self, data: &[i16], channels: usize) {
        for frame in data.chunks_exact(channels.max(1)) {
            if !self.keep_frame() {
                continue;
            }
            if self.fold_mono {
                // Sum channels without division to preserve volume
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                self.push_sample(sum.clamp(i16::MIN as i32, i16::MAX as i32) as i16);
            } else {
                for &sample in frame {
                    self.push_sample(sample);
                }
            }
        }
        self.drain_full_chunks();
    }

    fn keep_frame(&mut self) -> bool {
        let keep = self.phase == 0;
        self.phase = (self.phase + 1) % self.step;
        keep
    }

    fn push_sample(&mut self, sample: i16) {
        self.pending.extend_from_slice(&sample.to_le_bytes());
    }

    fn drain_full_chunks(&mut self) {
        while self.pending.len() >= self.chunk_bytes {
            let rest = self.pending.split_off(self.chunk_bytes);
            let data = std::mem::replace(&mut self.pending, rest);
            self.send(data);
        }
    }

    /// Emit whatever is pending as a final short fragment
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let data = std::mem::take(&mut self.pending);
        self.send(data);
    }

    fn send(&self, data: Vec<u8>) {
        let chunk = MediaChunk {
            data,
            mime_type: self.mime_type.clone(),
        };
        if self.tx.try_send(chunk).is_err() {
            warn!("Fragment channel full or closed; dropping capture fragment");
        }
    }
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

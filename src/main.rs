use anyhow::{Context, Result};
use clap::Parser;
use overlay_capture::{
    create_router, AppState, CaptureBackendFactory, Config, NatsTranscriber, RecordingCoordinator,
};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "overlay-capture", about = "Audio capture and transcription service")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/overlay-capture")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v0.1.0", cfg.service.name);

    let backend = CaptureBackendFactory::create((&cfg.capture).into())
        .context("Failed to create capture backend")?;

    let transcriber =
        NatsTranscriber::connect(&cfg.transcription.nats_url, cfg.transcription.subject.clone())
            .await
            .context("Failed to connect to transcription service")?;

    let coordinator = Arc::new(RecordingCoordinator::new(
        Arc::from(backend),
        Arc::new(transcriber),
    ));

    let app = create_router(AppState::new(coordinator));
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);

    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

//! Headless kernel client: connects to a rendering kernel, keeps a tile mosaic
//! of the document in sync and logs what it would draw.

mod session;
mod surface;

use std::time::Duration;

use clap::Parser;
use engine::{Engine, EngineConfig, SystemClock};
use rand::Rng;
use tracing::{info, warn};

use crate::session::{RunnerError, SessionConfig, backoff_delay};
use crate::surface::LogSurface;

const MAX_JITTER_MS: u64 = 250;

#[derive(Parser, Debug)]
#[command(name = "mosaic", about = "Headless tile client for a document rendering kernel")]
struct Args {
    /// Kernel websocket URL.
    #[arg(long, env = "MOSAIC_URL", default_value = "ws://127.0.0.1:9980/kernel")]
    url: String,

    /// Document the kernel should load, as a URL it can resolve.
    #[arg(long = "doc", env = "MOSAIC_DOC")]
    document: String,

    /// Device pixels per CSS pixel.
    #[arg(long, env = "MOSAIC_DPI_SCALE", default_value_t = 1.0)]
    dpi_scale: f64,

    #[arg(long, env = "MOSAIC_VIEWPORT_WIDTH", default_value_t = 1280.0)]
    viewport_width: f64,

    #[arg(long, env = "MOSAIC_VIEWPORT_HEIGHT", default_value_t = 800.0)]
    viewport_height: f64,

    /// Open the document with edit permission.
    #[arg(long, env = "MOSAIC_EDIT", default_value_t = false)]
    edit: bool,

    /// Reconnect after this long without an inbound frame.
    #[arg(long, env = "MOSAIC_RECV_TIMEOUT_MS", default_value_t = 30_000)]
    recv_timeout_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), RunnerError> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let engine_config = EngineConfig::from_env().with_dpi_scale(args.dpi_scale);
    let config = SessionConfig {
        url: args.url.clone(),
        document: args.document.clone(),
        viewport_width: args.viewport_width,
        viewport_height: args.viewport_height,
        recv_timeout: Duration::from_millis(args.recv_timeout_ms),
        prefetch_interval: Duration::from_millis(engine_config.prefetch_interval_ms),
    };
    config.validate()?;

    let mut engine = Engine::new(engine_config, LogSurface::default(), Box::new(SystemClock::new()));
    engine.set_edit_permission(args.edit);

    let mut attempt = 0_u32;
    let mut resume = false;
    loop {
        let result = tokio::select! {
            result = connect_and_run(&mut engine, &config, resume) => result,
            _ = tokio::signal::ctrl_c() => break,
        };
        match result {
            Ok(()) => attempt = 0,
            Err(error) => {
                warn!(%error, attempt, "session ended");
                attempt = attempt.saturating_add(1);
            }
        }
        resume = resume || !engine.state().view.panes.is_empty();

        let jitter = rand::rng().random_range(0..=MAX_JITTER_MS);
        let delay = backoff_delay(attempt.saturating_sub(1), jitter);
        info!(delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX), attempt, "reconnecting");
        tokio::time::sleep(delay).await;
    }

    let surface = engine.surface();
    info!(
        tiles = surface.tiles_painted,
        bytes = surface.bytes_painted,
        dialogs = surface.dialogs_painted,
        "interrupted, exiting"
    );
    Ok(())
}

async fn connect_and_run(
    engine: &mut Engine<LogSurface>,
    config: &SessionConfig,
    resume: bool,
) -> Result<(), RunnerError> {
    let stream = session::connect(config).await?;
    session::run(engine, stream, config, resume).await
}

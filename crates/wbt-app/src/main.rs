use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use wbt_core::cache::RecognitionCache;
use wbt_core::metrics::Metrics;
use wbt_core::state::AppState;
use wbt_core::store::StateStore;
use wbt_io::EnigoEmitter;
use wbt_lookup::DatamuseClient;
use wbt_ocr::{OcrError, TesseractRecognizer, XcapCapture, default_bindings};
use wbt_types::{CaptureRegion, UiEvent};

pub mod context;
pub mod controller;
pub mod events;
pub mod logging;
pub mod persist;
pub mod pool;
pub mod ui;

#[cfg(test)]
mod tests;

use context::AppContext;
use controller::AppController;
use events::commands::help_text;
use persist::{AppPaths, ChannelSink, load_config, load_state, save_metrics, save_state};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Reads the letters on screen and types matching words
#[derive(Parser, Debug)]
#[command(name = "wbt", version)]
struct Args {
    /// JSON settings file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Directory for the saved state, metrics and log file
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Capture region as LEFT,TOP,WIDTH,HEIGHT
    #[arg(long, value_parser = parse_region)]
    region: Option<CaptureRegion>,

    /// Start with auto mode on
    #[arg(long)]
    auto: bool,
}

fn parse_region(s: &str) -> Result<CaptureRegion, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [left, top, width, height] = *parts.as_slice() else {
        return Err("expected LEFT,TOP,WIDTH,HEIGHT".to_string());
    };
    let number = |v: &str| v.parse::<i64>().map_err(|e| format!("'{v}': {e}"));
    let (left, top, width, height) = (
        number(left)?,
        number(top)?,
        number(width)?,
        number(height)?,
    );
    if width <= 0 || height <= 0 {
        return Err("width and height must be positive".to_string());
    }
    Ok(CaptureRegion {
        left: i32::try_from(left).map_err(|e| e.to_string())?,
        top: i32::try_from(top).map_err(|e| e.to_string())?,
        width: u32::try_from(width).map_err(|e| e.to_string())?,
        height: u32::try_from(height).map_err(|e| e.to_string())?,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            if matches!(e.downcast_ref::<OcrError>(), Some(OcrError::EngineMissing(_))) {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    let paths = AppPaths::resolve(args.data_dir.clone(), &config)?;
    logging::init(&paths.log_file)?;
    tracing::info!(data_dir = %paths.data_dir.display(), "starting wbt");

    // Nothing works without the engine
    let recognizer =
        TesseractRecognizer::locate(config.ocr.tesseract_path.as_deref(), config.ocr.threshold)?;
    let provider = DatamuseClient::new(config.lookup.api_url.clone(), config.lookup.timeout())?;

    let persisted = load_state(&paths.state_file);
    let mut state = AppState::from_persisted(&persisted, config.typing.max_typed_history);
    if let Some(region) = args.region {
        state.region = Some(region);
    }
    state.auto_mode = args.auto;

    let controller = AppController::new();
    let channels = controller.channels();
    let sink = Arc::new(ChannelSink::new(channels.snapshots.0.clone()));

    let ctx = AppContext {
        store: Arc::new(StateStore::new(state).with_sink(sink)),
        cache: Arc::new(RecognitionCache::new(
            config.ocr.cache_ttl(),
            config.ocr.cache_capacity,
        )),
        metrics: Arc::new(Metrics::new()),
        capture: Arc::new(XcapCapture),
        recognizer: Arc::new(recognizer),
        provider: Arc::new(provider),
        emitter: Arc::new(EnigoEmitter::new(config.typing.key_delay())),
        ui_tx: channels.app_to_ui.0.clone(),
        config: Arc::new(config),
    };

    let ui = ui::spawn_ui(
        channels.app_to_ui.1.clone(),
        channels.ui_to_app.0.clone(),
        ctx.config.ui.clone(),
    )
    .context("Failed to start UI thread")?;

    let snapshot = ctx.store.snapshot().await;
    ctx.notify(UiEvent::ShowHelp(help_text(&snapshot, &default_bindings())));
    match snapshot.region {
        Some(region) => ctx.notify(UiEvent::ShowRegion(Some(region))),
        None => ctx.notify(UiEvent::SelectRegion),
    }

    let pool = controller.worker_pool(ctx.config.worker_threads);
    let mut tasks = controller.spawn_tasks(ctx.clone(), pool.clone(), paths.state_file.clone());

    tokio::select! {
        _ = signal::ctrl_c() => tracing::info!("Shutdown requested"),
        _ = controller.cancelled() => tracing::info!("Quit requested"),
        Some(result) = tasks.join_next() => match result {
            Ok(Ok(())) => tracing::warn!("app task exited"),
            Ok(Err(e)) => tracing::error!("app task failed: {e:#}"),
            Err(e) => tracing::error!("app task panicked: {e}"),
        },
    }

    // Shutdown: stop triggers, let running work finish, then save
    ctx.store.set_auto_mode(false).await;
    pool.close();
    controller.shutdown();
    if tokio::time::timeout(SHUTDOWN_GRACE, controller.wait_for_workers())
        .await
        .is_err()
    {
        tracing::warn!("workers still running after {SHUTDOWN_GRACE:?}, exiting anyway");
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, async { while tasks.join_next().await.is_some() {} })
        .await
        .is_err()
    {
        tasks.abort_all();
    }

    let snapshot = ctx.store.snapshot().await;
    if let Err(e) = save_state(&paths.state_file, &snapshot.persisted()) {
        tracing::error!("Failed to save state: {e:#}");
    }
    if let Err(e) = save_metrics(&paths.metrics_file, &ctx.metrics.snapshot()) {
        tracing::error!("Failed to save metrics: {e:#}");
    }

    ctx.notify(UiEvent::Close);
    if !matches!(tokio::task::spawn_blocking(move || ui.join()).await, Ok(Ok(()))) {
        tracing::warn!("UI thread did not stop cleanly");
    }

    tracing::info!(typed = snapshot.total_typed, "stopped");
    Ok(())
}

use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;
use wbt_ocr::default_bindings;
use wbt_types::{AppEvent, Command, UiEvent};

use crate::context::AppContext;
use crate::pool::WorkerPool;

pub mod commands;
pub mod trigger_recognition;
pub mod watcher;

use commands::{
    handle_clear_history, handle_region_selected, handle_search_mode, handle_sort_mode,
    handle_undo, help_text,
};
use watcher::WatcherControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// App's main loop. Returns when the UI asks to quit, the channel closes or
/// `shutdown` fires.
pub async fn event_loop(
    ctx: AppContext,
    pool: WorkerPool,
    mut watcher: WatcherControl,
    ui_to_app_rx: AsyncReceiver<AppEvent>,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    if ctx.store.auto_mode().await {
        watcher.start(ctx.clone(), pool.clone());
    }

    tracing::info!("event loop started");
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = ui_to_app_rx.recv() => match event {
                Ok(event) => event,
                Err(_) => {
                    tracing::info!("UI channel closed");
                    break;
                }
            },
        };

        tracing::debug!(?event, "event received");
        if handle_event(&ctx, &pool, &mut watcher, event).await == Flow::Quit {
            shutdown.cancel();
            break;
        }
    }

    watcher.stop();
    Ok(())
}

pub async fn handle_event(
    ctx: &AppContext,
    pool: &WorkerPool,
    watcher: &mut WatcherControl,
    event: AppEvent,
) -> Flow {
    match event {
        AppEvent::Command(command) => handle_command(ctx, pool, watcher, command).await,
        AppEvent::RegionSelected(region) => {
            handle_region_selected(ctx, region).await;
            Flow::Continue
        }
    }
}

async fn handle_command(
    ctx: &AppContext,
    pool: &WorkerPool,
    watcher: &mut WatcherControl,
    command: Command,
) -> Flow {
    match command {
        Command::TriggerRecognition => pool.dispatch(ctx.clone()),
        Command::SelectRegion => {
            tracing::info!("region reselection requested");
            ctx.notify(UiEvent::SelectRegion);
        }
        Command::CycleSearchMode => handle_search_mode(ctx).await,
        Command::CycleSortMode => handle_sort_mode(ctx).await,
        Command::ClearHistory => handle_clear_history(ctx).await,
        Command::UndoLast => handle_undo(ctx).await,
        Command::ToggleAutoMode => {
            if ctx.store.toggle_auto_mode().await {
                tracing::info!("auto mode enabled");
                ctx.notify(UiEvent::info("Auto mode ENABLED. Watching for changes..."));
                watcher.start(ctx.clone(), pool.clone());
            } else {
                tracing::info!("auto mode disabled");
                ctx.notify(UiEvent::info("Auto mode DISABLED"));
                watcher.stop();
            }
        }
        Command::ToggleDisplay => ctx.notify(UiEvent::ToggleDisplay),
        Command::ShowHelp => {
            let state = ctx.store.snapshot().await;
            ctx.notify(UiEvent::ShowHelp(help_text(&state, &default_bindings())));
        }
        Command::Quit => {
            tracing::info!("quit requested");
            return Flow::Quit;
        }
    }
    Flow::Continue
}

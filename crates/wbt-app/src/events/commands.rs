use wbt_core::state::AppState;
use wbt_ocr::Binding;
use wbt_types::{CaptureRegion, Command, UiEvent};

use crate::context::AppContext;

pub async fn handle_search_mode(ctx: &AppContext) {
    let mode = ctx.store.cycle_search_mode().await;
    tracing::info!(mode = %mode, "search mode changed");
    ctx.notify(UiEvent::info(format!("Changed search mode to '{mode}'")));
}

pub async fn handle_sort_mode(ctx: &AppContext) {
    let mode = ctx.store.cycle_sort_mode().await;
    tracing::info!(mode = %mode, "sort mode changed");
    ctx.notify(UiEvent::info(format!("Changed sort mode to '{mode}'")));
    if ctx.store.snapshot().await.suggestions.is_some() {
        ctx.notify(UiEvent::info("Re-sorted existing suggestions"));
    }
}

pub async fn handle_clear_history(ctx: &AppContext) {
    ctx.store.clear_history().await;
    tracing::info!("typed history cleared");
    ctx.notify(UiEvent::info("Cleared history of typed words"));
}

pub async fn handle_undo(ctx: &AppContext) {
    match ctx.store.undo().await {
        Some(word) => {
            tracing::info!(word = %word, "undo");
            ctx.notify(UiEvent::info(format!("'{word}' can be typed again")));
        }
        None => ctx.notify(UiEvent::info("Nothing to undo")),
    }
}

/// Applies a finished region selection; `None` keeps the old region
pub async fn handle_region_selected(ctx: &AppContext, region: Option<CaptureRegion>) {
    match region {
        Some(region) => {
            ctx.store.set_region(region).await;
            ctx.cache.clear();
            tracing::info!(%region, "region selected");
            ctx.notify(UiEvent::info(format!("New region selected: {region}")));
            ctx.notify(UiEvent::ShowRegion(Some(region)));
        }
        None => {
            ctx.notify(UiEvent::warn("Region selection cancelled"));
            ctx.notify(UiEvent::ShowRegion(ctx.store.region().await));
        }
    }
}

pub fn help_text(state: &AppState, bindings: &[Binding]) -> String {
    let rule = "=".repeat(45);
    let mut lines = vec![
        rule.clone(),
        format!("Current Mode     : {}", state.search_mode),
        format!("Current Sort     : {}", state.sort_mode),
        format!(
            "Auto Mode        : {}",
            if state.auto_mode { "ON" } else { "OFF" }
        ),
        format!("Words Typed      : {}", state.total_typed),
        format!("Datamuse         : {}", state.provider_status),
        match state.region {
            Some(region) => format!("Region           : {region}"),
            None => "Region           : not selected".to_string(),
        },
        String::new(),
    ];

    for command in Command::ALL {
        let key = bindings
            .iter()
            .find(|b| b.command == command)
            .map_or("unbound", |b| b.label);
        lines.push(format!("{:<17}: {}", key, command.label()));
    }
    lines.push(rule);
    lines.join("\n")
}

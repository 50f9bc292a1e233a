//! Command handling on the app side of the channels

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use wbt_types::{AppEvent, CaptureRegion, Command, SearchMode, SortMode, UiEvent};

use super::fakes::{Harness, REGION};
use crate::events::trigger_recognition::run_pipeline;
use crate::events::watcher::WatcherControl;
use crate::events::{Flow, event_loop, handle_event};
use crate::pool::WorkerPool;

struct Loop {
    pool: WorkerPool,
    watcher: WatcherControl,
}

impl Loop {
    fn new() -> Self {
        let tracker = TaskTracker::new();
        Self {
            pool: WorkerPool::new(2, tracker.clone()),
            watcher: WatcherControl::new(tracker, CancellationToken::new()),
        }
    }

    async fn command(&mut self, h: &Harness, command: Command) -> Flow {
        handle_event(&h.ctx, &self.pool, &mut self.watcher, AppEvent::Command(command)).await
    }
}

async fn typed_cat(h: &Harness) {
    h.screen.show("cat");
    h.provider.words("cat", &["cat", "cats", "catalog"]);
    run_pipeline(&h.ctx).await.unwrap();
}

#[tokio::test]
async fn test_search_mode_change_forces_new_lookup() {
    let h = Harness::new().await;
    let mut lp = Loop::new();
    typed_cat(&h).await;

    lp.command(&h, Command::CycleSearchMode).await;
    let state = h.ctx.store.snapshot().await;
    assert_eq!(state.search_mode, SearchMode::Rhymes);
    assert!(state.suggestions.is_none());
    assert!(state.last_recognized_text.is_none());

    run_pipeline(&h.ctx).await.unwrap();
    let queries = h.provider.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].mode, SearchMode::Rhymes);
}

#[tokio::test]
async fn test_sort_mode_change_resorts_loaded_set() {
    let h = Harness::new().await;
    let mut lp = Loop::new();
    typed_cat(&h).await;

    lp.command(&h, Command::CycleSortMode).await;
    let state = h.ctx.store.snapshot().await;
    assert_eq!(state.sort_mode, SortMode::Longest);
    let set = state.suggestions.unwrap();
    assert_eq!(set.words, vec!["catalog", "cats", "cat"]);
    assert_eq!(set.cursor, 0);

    let events = h.ui_events();
    assert!(events.iter().any(|e| matches!(
        e,
        UiEvent::Log { message, .. } if message == "Re-sorted existing suggestions"
    )));
}

#[tokio::test]
async fn test_undo_and_clear_history() {
    let h = Harness::new().await;
    let mut lp = Loop::new();
    typed_cat(&h).await;
    run_pipeline(&h.ctx).await.unwrap();
    assert_eq!(h.ctx.store.snapshot().await.total_typed, 2);

    lp.command(&h, Command::UndoLast).await;
    let state = h.ctx.store.snapshot().await;
    assert!(state.history.contains("cat"));
    assert!(!state.history.contains("cats"));
    assert_eq!(state.total_typed, 1);

    lp.command(&h, Command::ClearHistory).await;
    let state = h.ctx.store.snapshot().await;
    assert!(state.history.is_empty());
    assert_eq!(state.total_typed, 0);

    lp.command(&h, Command::UndoLast).await;
    let events = h.ui_events();
    assert!(events.iter().any(|e| matches!(
        e,
        UiEvent::Log { message, .. } if message == "Nothing to undo"
    )));
}

#[tokio::test]
async fn test_region_selection_clears_cache() {
    let h = Harness::new().await;
    let mut lp = Loop::new();
    typed_cat(&h).await;
    assert!(!h.ctx.cache.is_empty());

    let region = CaptureRegion {
        left: 0,
        top: 0,
        width: 50,
        height: 20,
    };
    handle_event(
        &h.ctx,
        &lp.pool,
        &mut lp.watcher,
        AppEvent::RegionSelected(Some(region)),
    )
    .await;

    assert!(h.ctx.cache.is_empty());
    assert_eq!(h.ctx.store.region().await, Some(region));
    let events = h.ui_events();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, UiEvent::ShowRegion(Some(r)) if *r == region))
    );
}

#[tokio::test]
async fn test_cancelled_selection_keeps_region() {
    let h = Harness::new().await;
    let mut lp = Loop::new();

    handle_event(
        &h.ctx,
        &lp.pool,
        &mut lp.watcher,
        AppEvent::RegionSelected(None),
    )
    .await;

    assert_eq!(h.ctx.store.region().await, Some(REGION));
    let events = h.ui_events();
    assert!(
        events
            .iter()
            .any(|e| matches!(e, UiEvent::ShowRegion(Some(r)) if *r == REGION))
    );
}

#[tokio::test]
async fn test_auto_mode_toggle_controls_watcher() {
    let h = Harness::new().await;
    let mut lp = Loop::new();
    h.screen.show("cat");

    lp.command(&h, Command::ToggleAutoMode).await;
    assert!(h.ctx.store.auto_mode().await);
    assert!(lp.watcher.is_running());

    lp.command(&h, Command::ToggleAutoMode).await;
    assert!(!h.ctx.store.auto_mode().await);
    assert!(!lp.watcher.is_running());
}

#[tokio::test]
async fn test_trigger_dispatches_a_run() {
    let h = Harness::new().await;
    let mut lp = Loop::new();
    h.screen.show("cat");
    h.provider.words("cat", &["cat"]);

    assert_eq!(lp.command(&h, Command::TriggerRecognition).await, Flow::Continue);
    h.wait_until(|h| h.emitter.typed() == vec!["cat"]).await;
}

#[tokio::test]
async fn test_help_and_display_reach_ui() {
    let h = Harness::new().await;
    let mut lp = Loop::new();

    lp.command(&h, Command::ShowHelp).await;
    lp.command(&h, Command::ToggleDisplay).await;
    lp.command(&h, Command::SelectRegion).await;

    let events = h.ui_events();
    assert!(matches!(
        &events[0],
        UiEvent::ShowHelp(text) if text.contains("Current Sort     : Shortest")
    ));
    assert!(matches!(events[1], UiEvent::ToggleDisplay));
    assert!(matches!(events[2], UiEvent::SelectRegion));
}

#[tokio::test]
async fn test_quit_ends_event_loop() {
    let h = Harness::new().await;
    let lp = Loop::new();
    let (tx, rx) = kanal::bounded_async(8);
    let shutdown = CancellationToken::new();

    tx.send(AppEvent::Command(Command::CycleSortMode)).await.unwrap();
    tx.send(AppEvent::Command(Command::Quit)).await.unwrap();
    event_loop(h.ctx.clone(), lp.pool, lp.watcher, rx, shutdown.clone())
        .await
        .unwrap();

    assert!(shutdown.is_cancelled());
    assert_eq!(h.ctx.store.snapshot().await.sort_mode, SortMode::Longest);
}

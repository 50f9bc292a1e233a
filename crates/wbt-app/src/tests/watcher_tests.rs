//! Watcher timing under paused time

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::fakes::Harness;
use crate::events::watcher::{supervise, watch_region};
use crate::pool::WorkerPool;

fn pool() -> WorkerPool {
    WorkerPool::new(2, TaskTracker::new())
}

#[tokio::test(start_paused = true)]
async fn test_dispatches_only_on_change() {
    let h = Harness::new().await;
    h.screen.show("cat");
    h.provider.words("cat", &["cat", "cats"]);
    h.provider.words("dog", &["dog"]);
    h.ctx.store.set_auto_mode(true).await;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_region(h.ctx.clone(), pool(), cancel.clone()));

    // Polls at 0s, 1s and 2s all see "cat"
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(h.emitter.typed(), vec!["cat"]);
    assert_eq!(h.provider.calls(), 1);

    h.screen.show("dog");
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(h.emitter.typed(), vec!["cat", "dog"]);
    assert_eq!(h.provider.calls(), 2);

    cancel.cancel();
    watcher.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_blank_region_is_not_a_change() {
    let h = Harness::new().await;
    h.screen.show("...");
    h.ctx.store.set_auto_mode(true).await;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_region(h.ctx.clone(), pool(), cancel.clone()));

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(h.provider.calls(), 0);
    // No backoff for blank frames: one poll per second
    assert_eq!(h.screen.captures(), 4);

    cancel.cancel();
    watcher.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stops_when_auto_mode_disabled() {
    let h = Harness::new().await;
    h.screen.show("cat");
    h.ctx.store.set_auto_mode(true).await;

    let watcher = tokio::spawn(watch_region(
        h.ctx.clone(),
        pool(),
        CancellationToken::new(),
    ));
    sleep(Duration::from_millis(500)).await;
    h.ctx.store.set_auto_mode(false).await;

    tokio::time::timeout(Duration::from_secs(5), watcher)
        .await
        .expect("watcher kept running")
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_failures_back_off() {
    let h = Harness::new().await;
    h.screen.fail();
    h.ctx.store.set_auto_mode(true).await;

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(watch_region(h.ctx.clone(), pool(), cancel.clone()));

    // Fail at 0s, sleep 1s interval + 2s backoff
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(h.screen.captures(), 1);

    // Fail at 3s, next wait is 1s + 4s
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(h.screen.captures(), 2);
    sleep(Duration::from_millis(4000)).await;
    assert_eq!(h.screen.captures(), 2);

    // Recovery at 8s resets the backoff
    h.screen.show("cat");
    sleep(Duration::from_millis(1000)).await;
    assert!(h.screen.captures() >= 3);
    assert_eq!(h.provider.calls(), 1);

    cancel.cancel();
    watcher.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_restarts_panicked_task() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();

    supervise(
        "flaky",
        CancellationToken::new(),
        Duration::from_millis(10),
        move || {
            let run = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if run == 0 {
                    panic!("first run dies");
                }
            }
        },
    )
    .await;

    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_supervisor_gives_up_after_cancel() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let cancel = CancellationToken::new();
    let inner = cancel.clone();

    supervise("doomed", cancel, Duration::from_millis(10), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        let inner = inner.clone();
        async move {
            inner.cancel();
            panic!("always dies");
        }
    })
    .await;

    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

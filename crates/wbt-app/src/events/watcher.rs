use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use wbt_config::ocr::OcrConfig;
use wbt_core::error::PipelineError;
use wbt_types::UiEvent;

use crate::context::AppContext;
use crate::events::trigger_recognition::recognize_region;
use crate::pool::WorkerPool;

/// Extra sleep after consecutive failed cycles: doubles from `base`, capped
/// at `max`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            base: Duration::from_millis(config.error_backoff_ms),
            max: Duration::from_millis(config.max_backoff_ms.max(config.error_backoff_ms)),
        }
    }

    pub fn delay_after(&self, failures: u32) -> Duration {
        if failures == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (failures - 1).min(16);
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// Polls the region while auto mode is on and dispatches a run whenever the
/// recognized text changes
pub async fn watch_region(ctx: AppContext, pool: WorkerPool, cancel: CancellationToken) {
    let interval = ctx.config.ocr.interval();
    let backoff = BackoffPolicy::from_config(&ctx.config.ocr);
    let mut last_seen: Option<String> = None;
    let mut failures = 0u32;

    tracing::info!(interval_ms = interval.as_millis() as u64, "watcher started");

    loop {
        if cancel.is_cancelled() || !ctx.store.auto_mode().await {
            break;
        }

        let mut delay = interval;
        if let Some(region) = ctx.store.region().await {
            match recognize_region(&ctx, region).await {
                Ok(text) => {
                    failures = 0;
                    if last_seen.as_deref() != Some(text.as_str()) {
                        tracing::info!(text = %text, previous = ?last_seen, "change detected");
                        ctx.notify(UiEvent::info(format!("Change detected: '{text}'")));
                        last_seen = Some(text);
                        pool.dispatch(ctx.clone());
                    }
                }
                // Blank region, nothing to react to
                Err(PipelineError::EmptyRecognition) => failures = 0,
                Err(e) => {
                    failures = failures.saturating_add(1);
                    delay += backoff.delay_after(failures);
                    tracing::warn!(
                        failures,
                        delay_ms = delay.as_millis() as u64,
                        "watcher cycle failed: {e}"
                    );
                }
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    tracing::info!("watcher stopped");
}

/// Runs the task built by `make` and builds a fresh one whenever it panics,
/// until it returns normally or `cancel` fires
pub async fn supervise<F, Fut>(
    name: &'static str,
    cancel: CancellationToken,
    restart_delay: Duration,
    mut make: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        match tokio::spawn(make()).await {
            Ok(()) => break,
            Err(e) if e.is_panic() => {
                if cancel.is_cancelled() {
                    break;
                }
                tracing::error!(task = name, "task panicked, restarting");
            }
            Err(e) => {
                tracing::warn!(task = name, "task aborted: {e}");
                break;
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(restart_delay) => {}
        }
    }
}

/// Supervised watcher for one auto-mode session
pub async fn run_watcher(ctx: AppContext, pool: WorkerPool, cancel: CancellationToken) {
    let restart_delay = BackoffPolicy::from_config(&ctx.config.ocr).base;
    supervise("watcher", cancel.clone(), restart_delay, move || {
        watch_region(ctx.clone(), pool.clone(), cancel.clone())
    })
    .await
}

/// Starts and stops the watcher as auto mode flips
pub struct WatcherControl {
    tracker: TaskTracker,
    parent: CancellationToken,
    current: Option<CancellationToken>,
}

impl WatcherControl {
    pub fn new(tracker: TaskTracker, parent: CancellationToken) -> Self {
        Self {
            tracker,
            parent,
            current: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_cancelled())
    }

    pub fn start(&mut self, ctx: AppContext, pool: WorkerPool) {
        if self.is_running() {
            return;
        }
        let token = self.parent.child_token();
        self.tracker.spawn(run_watcher(ctx, pool, token.clone()));
        self.current = Some(token);
    }

    pub fn stop(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = BackoffPolicy {
            base: Duration::from_secs(2),
            max: Duration::from_secs(10),
        };
        assert_eq!(policy.delay_after(0), Duration::ZERO);
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(4));
        assert_eq!(policy.delay_after(3), Duration::from_secs(8));
        assert_eq!(policy.delay_after(4), Duration::from_secs(10));
        assert_eq!(policy.delay_after(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_backoff_from_config() {
        let policy = BackoffPolicy::from_config(&OcrConfig::default());
        assert_eq!(policy.base, Duration::from_millis(2000));
        assert_eq!(policy.max, Duration::from_millis(10000));
    }
}

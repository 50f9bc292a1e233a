use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;
use wbt_core::error::PipelineError;
use wbt_types::UiEvent;

use crate::context::AppContext;
use crate::events::trigger_recognition::{Outcome, run_pipeline};

/// Runs pipelines in the background, at most `workers` at a time
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl WorkerPool {
    pub fn new(workers: usize, tracker: TaskTracker) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(workers.max(1))),
            tracker,
        }
    }

    /// Queues one run and returns immediately
    pub fn dispatch(&self, ctx: AppContext) {
        let permits = self.permits.clone();
        self.tracker.spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            let result = run_pipeline(&ctx).await;
            report(&ctx, result);
        });
    }

    /// Rejects queued runs that have not started yet
    pub fn close(&self) {
        self.permits.close();
    }
}

/// Turns a finished run into log lines and UI messages
pub(crate) fn report(ctx: &AppContext, result: Result<Outcome, PipelineError>) {
    match result {
        Ok(Outcome::Typed { word, text }) => {
            ctx.notify(UiEvent::info(format!("Typed '{word}' for '{text}'")));
        }
        Ok(Outcome::Exhausted { text }) => {
            tracing::info!(text = %text, "all suggestions typed");
            ctx.notify(UiEvent::info(format!(
                "All available suggestions for '{text}' have been typed"
            )));
        }
        Ok(Outcome::Superseded { text }) => {
            tracing::debug!(text = %text, "run superseded");
        }
        Err(PipelineError::NoRegion) => {
            tracing::warn!("no capture region, requesting selection");
            ctx.notify(UiEvent::warn("No region selected"));
            ctx.notify(UiEvent::SelectRegion);
        }
        Err(e) if e.is_recognition_failure() => {
            tracing::warn!("recognition failed: {e}");
            ctx.notify(UiEvent::warn(format!("Nothing recognized: {e}")));
        }
        Err(e) => {
            tracing::error!("pipeline failed: {e}");
            ctx.notify(UiEvent::error(e.to_string()));
        }
    }
}

use std::path::PathBuf;

use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use wbt_core::state::PersistedState;
use wbt_types::{AppEvent, UiEvent};

use crate::context::AppContext;
use crate::events::event_loop;
use crate::events::watcher::WatcherControl;
use crate::persist::persist_loop;
use crate::pool::WorkerPool;

/// Centralized channel management
pub struct ChannelSet {
    pub app_to_ui: (AsyncSender<UiEvent>, AsyncReceiver<UiEvent>),
    pub ui_to_app: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
    pub snapshots: (AsyncSender<PersistedState>, AsyncReceiver<PersistedState>),
}

impl ChannelSet {
    pub fn new() -> Self {
        Self {
            app_to_ui: kanal::bounded_async(256), // pipeline log bursts
            ui_to_app: kanal::bounded_async(64),  // hotkey presses
            snapshots: kanal::unbounded_async(),
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    cancel_token: CancellationToken,
    tracker: TaskTracker,
}

impl AppController {
    pub fn new() -> Self {
        Self {
            channels: ChannelSet::new(),
            cancel_token: CancellationToken::new(),
            tracker: TaskTracker::new(),
        }
    }

    pub fn channels(&self) -> &ChannelSet {
        &self.channels
    }

    pub fn worker_pool(&self, workers: usize) -> WorkerPool {
        WorkerPool::new(workers, self.tracker.clone())
    }

    pub fn spawn_tasks(
        &self,
        ctx: AppContext,
        pool: WorkerPool,
        state_file: PathBuf,
    ) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        // Event loop
        let watcher = WatcherControl::new(self.tracker.clone(), self.cancel_token.child_token());
        tasks.spawn(event_loop(
            ctx,
            pool,
            watcher,
            self.channels.ui_to_app.1.clone(),
            self.cancel_token.clone(),
        ));

        // Snapshot writer
        tasks.spawn(persist_loop(
            self.channels.snapshots.1.clone(),
            state_file,
            self.cancel_token.child_token(),
        ));

        tasks
    }

    /// Resolves once shutdown has started, from any side
    pub async fn cancelled(&self) {
        self.cancel_token.cancelled().await
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
        self.tracker.close();
    }

    /// Waits for pipeline runs and watchers spawned so far
    pub async fn wait_for_workers(&self) {
        self.tracker.wait().await
    }
}

impl Default for AppController {
    fn default() -> Self {
        Self::new()
    }
}

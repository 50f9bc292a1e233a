use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use kanal::{AsyncReceiver, AsyncSender};
use tokio_util::sync::CancellationToken;
use wbt_config::Config;
use wbt_core::metrics::MetricsSnapshot;
use wbt_core::state::PersistedState;
use wbt_core::store::SnapshotSink;

/// Where the state snapshot, metrics and log file live
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_dir: PathBuf,
    pub state_file: PathBuf,
    pub metrics_file: PathBuf,
    pub log_file: PathBuf,
}

impl AppPaths {
    /// `data_dir` if given, else `<platform data dir>/wbt`, else the working
    /// directory. Creates the directory.
    pub fn resolve(data_dir: Option<PathBuf>, config: &Config) -> anyhow::Result<Self> {
        let data_dir = data_dir
            .or_else(|| dirs::data_dir().map(|d| d.join("wbt")))
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        Ok(Self {
            state_file: data_dir.join(&config.state_file),
            metrics_file: data_dir.join(&config.metrics_file),
            log_file: data_dir.join(&config.log_file),
            data_dir,
        })
    }
}

/// Settings file if given, then environment overrides
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::new());
    };
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let mut config: Config = serde_json::from_str(&data)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    config.apply_env();
    Ok(config)
}

/// Missing file gives defaults silently; an unreadable one is logged first
pub fn load_state(path: &Path) -> PersistedState {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => return PersistedState::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "Failed to read saved state: {e}");
            return PersistedState::default();
        }
    };
    serde_json::from_str(&data).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "Saved state is corrupt, using defaults: {e}");
        PersistedState::default()
    })
}

/// Writes next to the target and renames so a crash never leaves half a file
pub fn save_state(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    write_json(path, state)
}

pub fn save_metrics(path: &Path, metrics: &MetricsSnapshot) -> anyhow::Result<()> {
    write_json(path, metrics)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_string_pretty(value)?;
    fs::write(&tmp, data).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

/// Hands snapshots to [`persist_loop`] without blocking the store lock
pub struct ChannelSink {
    tx: AsyncSender<PersistedState>,
}

impl ChannelSink {
    pub fn new(tx: AsyncSender<PersistedState>) -> Self {
        Self { tx }
    }
}

impl SnapshotSink for ChannelSink {
    fn schedule(&self, snapshot: PersistedState) {
        if let Err(e) = self.tx.try_send(snapshot) {
            tracing::debug!("persistence channel closed: {e}");
        }
    }
}

/// Writes the newest pending snapshot each time one arrives. Bursts collapse
/// to their last element. Ends on `cancel` after flushing what is queued.
pub async fn persist_loop(
    rx: AsyncReceiver<PersistedState>,
    path: PathBuf,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    loop {
        let mut snapshot = tokio::select! {
            _ = cancel.cancelled() => match rx.try_recv() {
                Ok(Some(snapshot)) => snapshot,
                _ => break,
            },
            received = rx.recv() => match received {
                Ok(snapshot) => snapshot,
                Err(_) => break,
            },
        };
        while let Ok(Some(newer)) = rx.try_recv() {
            snapshot = newer;
        }

        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || save_state(&target, &snapshot)).await?;
        match result {
            Ok(()) => tracing::debug!(path = %path.display(), "state saved"),
            Err(e) => tracing::warn!("Failed to save state: {e:#}"),
        }
    }
    Ok(())
}

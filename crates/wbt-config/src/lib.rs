use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use self::lookup::LookupConfig;
use self::ocr::OcrConfig;
use self::typing::TypingConfig;
use self::ui::UiConfig;

pub mod lookup;
pub mod ocr;
pub mod typing;
pub mod ui;

fn default_worker_threads() -> usize {
    2
}

fn default_state_file() -> String {
    "ocr_config.json".to_string()
}

fn default_metrics_file() -> String {
    "ocr_metrics.json".to_string()
}

fn default_log_file() -> String {
    "ocr_helper.log".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrConfig,
    pub lookup: LookupConfig,
    pub typing: TypingConfig,
    pub ui: UiConfig,

    /// Concurrent pipeline runs
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// File names below the data directory
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_metrics_file")]
    pub metrics_file: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            lookup: LookupConfig::default(),
            typing: TypingConfig::default(),
            ui: UiConfig::default(),
            worker_threads: default_worker_threads(),
            state_file: default_state_file(),
            metrics_file: default_metrics_file(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// Defaults with environment overrides applied
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Environment variables win over file and default values
    pub fn apply_env(&mut self) {
        self.ocr.apply_env();
        self.lookup.apply_env();
        self.typing.apply_env();

        self.worker_threads = env_or("WBT_WORKER_THREADS", self.worker_threads).max(1);
        if let Ok(file) = env::var("WBT_STATE_FILE") {
            self.state_file = file;
        }
        if let Ok(file) = env::var("WBT_METRICS_FILE") {
            self.metrics_file = file;
        }
        if let Ok(file) = env::var("WBT_LOG_FILE") {
            self.log_file = file;
        }
    }
}

/// Parses `key` from the environment, keeping `fallback` when unset or invalid
pub(crate) fn env_or<T: FromStr>(key: &str, fallback: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(fallback)
}

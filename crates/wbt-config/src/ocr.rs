use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env_or;

fn default_interval_ms() -> u64 {
    1000
}

fn default_error_backoff_ms() -> u64 {
    2000
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_cache_capacity() -> usize {
    256
}

fn default_threshold() -> u8 {
    140
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    /// Auto mode poll interval
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Extra sleep after a failed poll cycle
    #[serde(default = "default_error_backoff_ms")]
    pub error_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Binarization cutoff applied before recognition
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// Explicit tesseract binary, otherwise looked up on PATH
    pub tesseract_path: Option<PathBuf>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            error_backoff_ms: default_error_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            threshold: default_threshold(),
            tesseract_path: None,
        }
    }
}

impl OcrConfig {
    pub(crate) fn apply_env(&mut self) {
        self.interval_ms = env_or("WBT_OCR_INTERVAL_MS", self.interval_ms);
        self.error_backoff_ms = env_or("WBT_OCR_BACKOFF_MS", self.error_backoff_ms);
        self.cache_ttl_secs = env_or("WBT_CACHE_TTL_SECS", self.cache_ttl_secs);
        self.cache_capacity = env_or("WBT_CACHE_CAPACITY", self.cache_capacity);
        if let Ok(path) = env::var("TESSERACT_PATH") {
            self.tesseract_path = Some(PathBuf::from(path));
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env_or;

fn default_api_url() -> String {
    "https://api.datamuse.com/words".to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_results() -> usize {
    50
}

/// Word lookup service settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LookupConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_ms: default_timeout_ms(),
            max_results: default_max_results(),
        }
    }
}

impl LookupConfig {
    pub(crate) fn apply_env(&mut self) {
        if let Ok(url) = env::var("WBT_LOOKUP_URL") {
            self.api_url = url;
        }
        self.timeout_ms = env_or("WBT_LOOKUP_TIMEOUT_MS", self.timeout_ms);
        self.max_results = env_or("WBT_LOOKUP_MAX_RESULTS", self.max_results);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

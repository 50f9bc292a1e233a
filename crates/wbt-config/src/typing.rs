use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env_or;

fn default_key_delay_ms() -> u64 {
    80
}

fn default_max_typed_history() -> usize {
    1000
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TypingConfig {
    /// Pause between synthetic keystrokes
    #[serde(default = "default_key_delay_ms")]
    pub key_delay_ms: u64,
    /// Oldest typed words are forgotten past this many
    #[serde(default = "default_max_typed_history")]
    pub max_typed_history: usize,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            key_delay_ms: default_key_delay_ms(),
            max_typed_history: default_max_typed_history(),
        }
    }
}

impl TypingConfig {
    pub(crate) fn apply_env(&mut self) {
        self.key_delay_ms = env_or("WBT_KEY_DELAY_MS", self.key_delay_ms);
        self.max_typed_history = env_or("WBT_MAX_TYPED_HISTORY", self.max_typed_history);
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }
}

use serde::{Deserialize, Serialize};

fn default_log_visible() -> bool {
    true
}

fn default_preview_count() -> usize {
    10
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    #[serde(default = "default_log_visible")]
    pub log_visible: bool,
    /// Suggestions listed in the log when a new set arrives
    #[serde(default = "default_preview_count")]
    pub preview_count: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            log_visible: default_log_visible(),
            preview_count: default_preview_count(),
        }
    }
}

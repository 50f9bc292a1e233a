use serde::{Deserialize, Serialize};
use wbt_types::{CaptureRegion, ProviderStatus, SearchMode, SortMode};

use crate::history::{TypedHistory, TypedRecord};

/// Ordered candidates for one (recognized text, sort mode) pair
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionSet {
    pub recognized_text: String,
    pub sort_mode: SortMode,
    pub words: Vec<String>,
    /// Where the next untyped scan starts; reduced modulo `words.len()` on use
    pub cursor: usize,
}

impl SuggestionSet {
    pub fn new(
        recognized_text: impl Into<String>,
        sort_mode: SortMode,
        words: Vec<String>,
    ) -> Self {
        Self {
            recognized_text: recognized_text.into(),
            sort_mode,
            words,
            cursor: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Everything the pipeline, watcher and command handlers share
#[derive(Debug, Clone)]
pub struct AppState {
    pub region: Option<CaptureRegion>,
    /// `None` means no set loaded
    pub suggestions: Option<SuggestionSet>,
    pub last_recognized_text: Option<String>,
    pub history: TypedHistory,
    pub auto_mode: bool,
    pub search_mode: SearchMode,
    pub sort_mode: SortMode,
    pub total_typed: u64,
    pub provider_status: ProviderStatus,
}

impl AppState {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            region: None,
            suggestions: None,
            last_recognized_text: None,
            history: TypedHistory::new(history_capacity),
            auto_mode: false,
            search_mode: SearchMode::default(),
            sort_mode: SortMode::default(),
            total_typed: 0,
            provider_status: ProviderStatus::Online,
        }
    }

    pub fn from_persisted(persisted: &PersistedState, history_capacity: usize) -> Self {
        let mut state = Self::new(history_capacity);
        state.region = persisted.region;
        state.search_mode =
            SearchMode::from_index(persisted.current_mode_index).unwrap_or_else(|| {
                tracing::warn!(
                    index = persisted.current_mode_index,
                    "unknown search mode index, using default"
                );
                SearchMode::default()
            });
        state.sort_mode =
            SortMode::from_index(persisted.current_sort_mode_index).unwrap_or_else(|| {
                tracing::warn!(
                    index = persisted.current_sort_mode_index,
                    "unknown sort mode index, using default"
                );
                SortMode::default()
            });
        state.total_typed = persisted.total_typed_count;
        state
    }

    pub fn persisted(&self) -> PersistedState {
        PersistedState {
            region: self.region,
            current_mode_index: self.search_mode.index(),
            current_sort_mode_index: self.sort_mode.index(),
            total_typed_count: self.total_typed,
        }
    }

    /// True when a repeat of `text` can reuse the loaded suggestions, which
    /// must have been built for that same text
    pub fn can_reuse_suggestions(&self, text: &str) -> bool {
        self.last_recognized_text.as_deref() == Some(text)
            && self
                .suggestions
                .as_ref()
                .is_some_and(|set| set.recognized_text == text && !set.is_empty())
    }

    /// Applies every present field of `update`. Returns true if a persisted
    /// field (region, modes, history or counter) changed.
    pub(crate) fn apply(&mut self, update: StateUpdate) -> bool {
        let mut persist = false;

        if let Some(region) = update.region {
            persist |= self.region != region;
            self.region = region;
        }
        if let Some(suggestions) = update.suggestions {
            self.suggestions = suggestions;
        }
        if let Some(cursor) = update.cursor {
            if let Some(set) = self.suggestions.as_mut() {
                set.cursor = cursor;
            }
        }
        if let Some(text) = update.last_recognized_text {
            self.last_recognized_text = text;
        }
        if let Some(auto_mode) = update.auto_mode {
            self.auto_mode = auto_mode;
        }
        if let Some(mode) = update.search_mode {
            persist |= self.search_mode != mode;
            self.search_mode = mode;
        }
        if let Some(mode) = update.sort_mode {
            persist |= self.sort_mode != mode;
            self.sort_mode = mode;
        }
        if let Some(change) = update.history {
            persist = true;
            match change {
                HistoryChange::Record(record) => {
                    self.history.push(record);
                }
                HistoryChange::Undo => {
                    self.history.undo();
                }
                HistoryChange::Forget(word) => {
                    self.history.forget(&word);
                }
                HistoryChange::Clear => self.history.clear(),
            }
        }
        if let Some(total) = update.total_typed {
            persist |= self.total_typed != total;
            self.total_typed = total;
        }
        if let Some(status) = update.provider_status {
            self.provider_status = status;
        }

        persist
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryChange {
    Record(TypedRecord),
    Undo,
    Forget(String),
    Clear,
}

/// A set of field updates applied together under the store lock
///
/// Every field is optional; `None` leaves the current value alone. Fields that
/// can themselves be unset use a nested `Option`.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub region: Option<Option<CaptureRegion>>,
    pub suggestions: Option<Option<SuggestionSet>>,
    pub cursor: Option<usize>,
    pub last_recognized_text: Option<Option<String>>,
    pub auto_mode: Option<bool>,
    pub search_mode: Option<SearchMode>,
    pub sort_mode: Option<SortMode>,
    pub history: Option<HistoryChange>,
    pub total_typed: Option<u64>,
    pub provider_status: Option<ProviderStatus>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(mut self, region: Option<CaptureRegion>) -> Self {
        self.region = Some(region);
        self
    }

    pub fn suggestions(mut self, suggestions: Option<SuggestionSet>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }

    pub fn cursor(mut self, cursor: usize) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn last_recognized_text(mut self, text: Option<String>) -> Self {
        self.last_recognized_text = Some(text);
        self
    }

    pub fn auto_mode(mut self, enabled: bool) -> Self {
        self.auto_mode = Some(enabled);
        self
    }

    pub fn search_mode(mut self, mode: SearchMode) -> Self {
        self.search_mode = Some(mode);
        self
    }

    pub fn sort_mode(mut self, mode: SortMode) -> Self {
        self.sort_mode = Some(mode);
        self
    }

    pub fn history(mut self, change: HistoryChange) -> Self {
        self.history = Some(change);
        self
    }

    pub fn total_typed(mut self, total: u64) -> Self {
        self.total_typed = Some(total);
        self
    }

    pub fn provider_status(mut self, status: ProviderStatus) -> Self {
        self.provider_status = Some(status);
        self
    }
}

fn default_mode_index() -> usize {
    SearchMode::default().index()
}

fn default_sort_mode_index() -> usize {
    SortMode::default().index()
}

/// On-disk snapshot of the fields that survive a restart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub region: Option<CaptureRegion>,
    #[serde(default = "default_mode_index")]
    pub current_mode_index: usize,
    #[serde(default = "default_sort_mode_index")]
    pub current_sort_mode_index: usize,
    pub total_typed_count: u64,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            region: None,
            current_mode_index: default_mode_index(),
            current_sort_mode_index: default_sort_mode_index(),
            total_typed_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_defaults() {
        let persisted: PersistedState = serde_json::from_str("{}").unwrap();
        assert_eq!(persisted.current_mode_index, 2);
        assert_eq!(persisted.current_sort_mode_index, 2);

        let state = AppState::from_persisted(&persisted, 10);
        assert_eq!(state.search_mode, SearchMode::Contains);
        assert_eq!(state.sort_mode, SortMode::Random);
        assert!(state.region.is_none());
    }

    #[test]
    fn test_persisted_wire_format() {
        let json = r#"{
            "region": {"left": 10, "top": 20, "width": 300, "height": 40},
            "current_mode_index": 0,
            "current_sort_mode_index": 9,
            "total_typed_count": 17
        }"#;
        let persisted: PersistedState = serde_json::from_str(json).unwrap();
        let state = AppState::from_persisted(&persisted, 10);

        assert_eq!(state.region.map(|r| r.width), Some(300));
        assert_eq!(state.search_mode, SearchMode::StartsWith);
        // Out of range falls back
        assert_eq!(state.sort_mode, SortMode::Random);
        assert_eq!(state.total_typed, 17);
    }

    #[test]
    fn test_reuse_requires_nonempty_set() {
        let mut state = AppState::new(10);
        state.last_recognized_text = Some("cat".into());
        assert!(!state.can_reuse_suggestions("cat"));

        state.suggestions = Some(SuggestionSet::new("cat", SortMode::Shortest, vec![]));
        assert!(!state.can_reuse_suggestions("cat"));

        let cats = vec!["cats".to_string()];
        state.suggestions = Some(SuggestionSet::new("cat", SortMode::Shortest, cats.clone()));
        assert!(state.can_reuse_suggestions("cat"));
        assert!(!state.can_reuse_suggestions("dog"));

        // Set built for another text
        state.last_recognized_text = Some("dog".into());
        assert!(!state.can_reuse_suggestions("dog"));
        state.suggestions = Some(SuggestionSet::new("dog", SortMode::Shortest, cats));
        assert!(state.can_reuse_suggestions("dog"));
    }

    #[test]
    fn test_apply_reports_persisted_changes() {
        let mut state = AppState::new(10);
        assert!(!state.apply(StateUpdate::new().auto_mode(true)));
        assert!(state.apply(StateUpdate::new().search_mode(SearchMode::Rhymes)));
        // Same value again is not a change
        assert!(!state.apply(StateUpdate::new().search_mode(SearchMode::Rhymes)));
        assert!(state.apply(StateUpdate::new().history(HistoryChange::Clear)));
    }
}

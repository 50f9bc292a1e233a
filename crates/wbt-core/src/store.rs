use std::sync::Arc;

use chrono::Local;
use tokio::sync::RwLock;
use wbt_types::{CaptureRegion, ProviderStatus, SearchMode, SortMode};

use crate::history::TypedRecord;
use crate::selector::{next_untyped, sort_suggestions};
use crate::state::{AppState, HistoryChange, PersistedState, StateUpdate, SuggestionSet};

/// Receives a snapshot whenever a persisted field changes. Must not block:
/// the store calls it while holding its lock.
pub trait SnapshotSink: Send + Sync {
    fn schedule(&self, snapshot: PersistedState);
}

/// What a run should do with freshly recognized text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Same text as last time with suggestions loaded: type the next one
    Reuse,
    /// New text, already recorded as the last recognized text
    Fetch {
        search_mode: SearchMode,
        sort_mode: SortMode,
    },
}

/// A word reserved for typing. Already in the history; release it if the
/// keystrokes could not be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub word: String,
    pub recognized_text: String,
}

/// Single owner of [`AppState`]
///
/// Reads hand out full clones; every write goes through one [`StateUpdate`]
/// applied under the write lock, so no reader ever sees half of an update.
pub struct StateStore {
    state: RwLock<AppState>,
    sink: Option<Arc<dyn SnapshotSink>>,
}

impl StateStore {
    pub fn new(state: AppState) -> Self {
        Self {
            state: RwLock::new(state),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub async fn snapshot(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn region(&self) -> Option<CaptureRegion> {
        self.state.read().await.region
    }

    pub async fn auto_mode(&self) -> bool {
        self.state.read().await.auto_mode
    }

    pub async fn merge(&self, update: StateUpdate) {
        self.transact(|_| ((), update)).await
    }

    /// Computes an update from the current state and applies it without
    /// releasing the lock in between
    async fn transact<R>(&self, f: impl FnOnce(&AppState) -> (R, StateUpdate)) -> R {
        let mut state = self.state.write().await;
        let (result, update) = f(&state);
        if state.apply(update) {
            if let Some(sink) = &self.sink {
                sink.schedule(state.persisted());
            }
        }
        result
    }

    /// Chooses between the fast path and a fresh lookup for `text`. A fresh
    /// lookup drops the loaded set so nothing is claimed from it meanwhile.
    pub async fn decide(&self, text: &str) -> Decision {
        self.transact(|state| {
            if state.can_reuse_suggestions(text) {
                return (Decision::Reuse, StateUpdate::new());
            }
            (
                Decision::Fetch {
                    search_mode: state.search_mode,
                    sort_mode: state.sort_mode,
                },
                StateUpdate::new()
                    .last_recognized_text(Some(text.to_string()))
                    .suggestions(None),
            )
        })
        .await
    }

    /// Replaces the active set with `set`, cursor at 0
    ///
    /// Returns `false` and changes nothing when the last recognized text has
    /// moved on since the lookup started. A set sorted for a mode that was
    /// cycled away meanwhile is re-sorted for the current one.
    pub async fn install_suggestions(&self, mut set: SuggestionSet) -> bool {
        self.transact(|state| {
            if state.last_recognized_text.as_deref() != Some(set.recognized_text.as_str()) {
                return (false, StateUpdate::new());
            }
            if set.sort_mode != state.sort_mode {
                set.words = sort_suggestions(&set.words, state.sort_mode);
                set.sort_mode = state.sort_mode;
            }
            set.cursor = 0;
            (true, StateUpdate::new().suggestions(Some(set)))
        })
        .await
    }

    /// Picks the next untyped word and records it, in one step
    pub async fn claim_next(&self) -> Option<Claim> {
        self.transact(|state| {
            let Some(set) = state.suggestions.as_ref() else {
                return (None, StateUpdate::new());
            };
            let Some((word, next_cursor)) =
                next_untyped(&set.words, set.cursor, state.history.words())
            else {
                return (None, StateUpdate::new());
            };

            let claim = Claim {
                word: word.to_string(),
                recognized_text: set.recognized_text.clone(),
            };
            let record = TypedRecord {
                word: claim.word.clone(),
                recognized_text: claim.recognized_text.clone(),
                timestamp: Local::now(),
            };
            let update = StateUpdate::new()
                .cursor(next_cursor)
                .history(HistoryChange::Record(record))
                .total_typed(state.total_typed + 1);
            (Some(claim), update)
        })
        .await
    }

    /// Gives back a claim whose keystrokes never went out
    pub async fn release_claim(&self, claim: &Claim) {
        self.transact(|state| {
            if !state.history.contains(&claim.word) {
                return ((), StateUpdate::new());
            }
            let update = StateUpdate::new()
                .history(HistoryChange::Forget(claim.word.clone()))
                .total_typed(state.total_typed.saturating_sub(1));
            ((), update)
        })
        .await
    }

    /// Forgets the most recently typed word so it can be typed again
    pub async fn undo(&self) -> Option<String> {
        self.transact(|state| {
            let Some(last) = state.history.last() else {
                return (None, StateUpdate::new());
            };
            let update = StateUpdate::new()
                .history(HistoryChange::Undo)
                .total_typed(state.total_typed.saturating_sub(1));
            (Some(last.word.clone()), update)
        })
        .await
    }

    pub async fn clear_history(&self) {
        self.merge(
            StateUpdate::new()
                .history(HistoryChange::Clear)
                .total_typed(0),
        )
        .await
    }

    /// Moves to the next search mode, dropping suggestions for the old one
    pub async fn cycle_search_mode(&self) -> SearchMode {
        self.transact(|state| {
            let mode = state.search_mode.next();
            let update = StateUpdate::new()
                .search_mode(mode)
                .suggestions(None)
                .last_recognized_text(None);
            (mode, update)
        })
        .await
    }

    /// Moves to the next sort mode and re-sorts the loaded set
    pub async fn cycle_sort_mode(&self) -> SortMode {
        self.transact(|state| {
            let mode = state.sort_mode.next();
            let mut update = StateUpdate::new().sort_mode(mode);
            if let Some(set) = state.suggestions.as_ref() {
                let words = sort_suggestions(&set.words, mode);
                update = update.suggestions(Some(SuggestionSet::new(
                    set.recognized_text.clone(),
                    mode,
                    words,
                )));
            }
            (mode, update)
        })
        .await
    }

    pub async fn set_region(&self, region: CaptureRegion) {
        self.merge(StateUpdate::new().region(Some(region))).await
    }

    pub async fn set_auto_mode(&self, enabled: bool) {
        self.merge(StateUpdate::new().auto_mode(enabled)).await
    }

    /// Flips auto mode and returns the new value
    pub async fn toggle_auto_mode(&self) -> bool {
        self.transact(|state| {
            let enabled = !state.auto_mode;
            (enabled, StateUpdate::new().auto_mode(enabled))
        })
        .await
    }

    pub async fn set_provider_status(&self, status: ProviderStatus) {
        self.merge(StateUpdate::new().provider_status(status)).await
    }
}

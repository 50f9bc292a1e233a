use std::sync::Arc;

use kanal::AsyncSender;
use wbt_config::Config;
use wbt_core::cache::RecognitionCache;
use wbt_core::metrics::Metrics;
use wbt_core::store::StateStore;
use wbt_io::ActionEmitter;
use wbt_lookup::SuggestionProvider;
use wbt_ocr::{Recognizer, ScreenCapture};
use wbt_types::UiEvent;

/// Everything a pipeline run or the watcher needs, bundled so tasks take one
/// argument. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<StateStore>,
    pub cache: Arc<RecognitionCache>,
    pub metrics: Arc<Metrics>,
    pub capture: Arc<dyn ScreenCapture>,
    pub recognizer: Arc<dyn Recognizer>,
    pub provider: Arc<dyn SuggestionProvider>,
    pub emitter: Arc<dyn ActionEmitter>,
    pub ui_tx: AsyncSender<UiEvent>,
}

impl AppContext {
    /// Posts a display message; a closed or full UI channel only gets logged
    pub fn notify(&self, event: UiEvent) {
        match self.ui_tx.try_send(event) {
            Ok(true) => {}
            Ok(false) => tracing::debug!("UI queue full, message dropped"),
            Err(e) => tracing::debug!("UI channel closed: {e}"),
        }
    }
}

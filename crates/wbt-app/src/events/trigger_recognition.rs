use std::time::Instant;

use wbt_core::cache::ContentHash;
use wbt_core::error::PipelineError;
use wbt_core::preprocess::{LetterNormalizer, TextNormalizer};
use wbt_core::selector::{is_single_token, sort_suggestions};
use wbt_core::state::SuggestionSet;
use wbt_core::store::Decision;
use wbt_lookup::{LookupError, LookupQuery};
use wbt_types::{CaptureRegion, ProviderStatus, SearchMode, UiEvent};

use crate::context::AppContext;

/// How a run that did not fail ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Typed { word: String, text: String },
    /// Every suggestion for `text` has been typed already
    Exhausted { text: String },
    /// Another run recognized different text while this one was looking up
    Superseded { text: String },
}

/// Captures `region` and returns its recognized text, consulting the cache
/// before the recognizer
pub async fn recognize_region(
    ctx: &AppContext,
    region: CaptureRegion,
) -> Result<String, PipelineError> {
    let capture = ctx.capture.clone();
    let image = tokio::task::spawn_blocking(move || capture.capture(region))
        .await?
        .map_err(|e| PipelineError::Capture(format!("{e:#}")))?;

    let hash = ContentHash::of(&image.data);
    if let Some(text) = ctx.cache.get(&hash) {
        tracing::debug!(%hash, text = %text, "recognition cache hit");
        return Ok(text);
    }

    let recognizer = ctx.recognizer.clone();
    let started = Instant::now();
    let raw = tokio::task::spawn_blocking(move || recognizer.recognize(&image)).await?;
    let elapsed = started.elapsed();

    let text = raw
        .map(|raw| {
            tracing::debug!(raw = %raw.trim(), "raw recognizer output");
            LetterNormalizer.normalize(&raw)
        })
        .map_err(|e| PipelineError::Recognition(format!("{e:#}")));
    let succeeded = matches!(&text, Ok(t) if !t.is_empty());
    ctx.metrics.record_recognition(succeeded, elapsed);

    let text = text?;
    if text.is_empty() {
        return Err(PipelineError::EmptyRecognition);
    }

    tracing::debug!(text = %text, elapsed_ms = elapsed.as_millis() as u64, "recognized");
    ctx.cache.put(hash, &text);
    Ok(text)
}

/// One full run: capture, recognize, decide, look up, then type one word
pub async fn run_pipeline(ctx: &AppContext) -> Result<Outcome, PipelineError> {
    let region = ctx.store.region().await.ok_or(PipelineError::NoRegion)?;
    let text = recognize_region(ctx, region).await?;

    match ctx.store.decide(&text).await {
        Decision::Reuse => {
            tracing::debug!(text = %text, "same text, reusing loaded suggestions");
        }
        Decision::Fetch {
            search_mode,
            sort_mode,
        } => {
            tracing::info!(text = %text, mode = %search_mode, "new text, fetching suggestions");
            let words = fetch_suggestions(ctx, &text, search_mode).await;
            let words = sort_suggestions(&words, sort_mode);
            log_preview(ctx, &text, &words);

            let set = SuggestionSet::new(text.clone(), sort_mode, words);
            if !ctx.store.install_suggestions(set).await {
                tracing::debug!(text = %text, "dropping suggestions for superseded text");
                return Ok(Outcome::Superseded { text });
            }
        }
    }

    let Some(claim) = ctx.store.claim_next().await else {
        return Ok(Outcome::Exhausted { text });
    };

    // Another run may have installed a set for newer text in between
    tracing::info!(word = %claim.word, text = %claim.recognized_text, "typing");
    let emitter = ctx.emitter.clone();
    let word = claim.word.clone();
    let sent = tokio::task::spawn_blocking(move || emitter.emit(&word)).await;

    match sent {
        Ok(Ok(())) => Ok(Outcome::Typed {
            word: claim.word,
            text: claim.recognized_text,
        }),
        Ok(Err(e)) => {
            ctx.store.release_claim(&claim).await;
            Err(PipelineError::Emission(e.to_string()))
        }
        Err(e) => {
            ctx.store.release_claim(&claim).await;
            Err(PipelineError::Task(e))
        }
    }
}

/// Queries the provider under the configured deadline. Failures record a
/// provider status and yield an empty list.
async fn fetch_suggestions(ctx: &AppContext, text: &str, mode: SearchMode) -> Vec<String> {
    let query = LookupQuery::new(text, mode, ctx.config.lookup.max_results);
    let started = Instant::now();

    let deadline = ctx.config.lookup.timeout();
    let result = match tokio::time::timeout(deadline, ctx.provider.suggest(&query)).await {
        Ok(result) => result,
        Err(_) => Err(LookupError::Timeout),
    };
    let elapsed = started.elapsed();
    ctx.metrics.record_lookup(result.is_ok(), elapsed);

    match result {
        Ok(words) => {
            ctx.store.set_provider_status(ProviderStatus::Online).await;
            let words: Vec<String> = words.into_iter().filter(|w| is_single_token(w)).collect();
            tracing::info!(
                text = %text,
                count = words.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "suggestions received"
            );
            words
        }
        Err(e) => {
            let status = e.status();
            tracing::warn!(text = %text, status = %status, "lookup failed: {e}");
            ctx.store.set_provider_status(status).await;
            ctx.notify(UiEvent::warn(format!("{status}: {e}")));
            Vec::new()
        }
    }
}

fn log_preview(ctx: &AppContext, text: &str, words: &[String]) {
    let count = ctx.config.ui.preview_count;
    if words.is_empty() || count == 0 {
        return;
    }
    let preview = words
        .iter()
        .take(count)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    tracing::debug!(text = %text, preview = %preview, "suggestion preview");
    ctx.notify(UiEvent::info(format!(
        "{} suggestions for '{text}': {preview}",
        words.len()
    )));
}

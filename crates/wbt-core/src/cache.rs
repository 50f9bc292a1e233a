use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use lru::LruCache;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// Digest of a captured pixel buffer, used as the recognition cache key
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(pixels: &[u8]) -> Self {
        Self(Sha256::digest(pixels).into())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    recorded_at: Instant,
}

/// Recognized text keyed by pixel content, valid for a fixed TTL
///
/// Expired entries are dropped lazily when looked up. The map is also bounded:
/// once `capacity` keys are stored the least recently used one is evicted.
pub struct RecognitionCache {
    entries: Mutex<LruCache<ContentHash, CacheEntry>>,
    ttl: Duration,
}

impl RecognitionCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub fn get(&self, hash: &ContentHash) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(hash) {
            if entry.recorded_at.elapsed() < self.ttl {
                return Some(entry.text.clone());
            }
            tracing::debug!(%hash, "recognition cache entry expired");
        }
        entries.pop(hash);
        None
    }

    /// Empty text is never cached
    pub fn put(&self, hash: ContentHash, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.put(
            hash,
            CacheEntry {
                text: text.to_string(),
                recorded_at: Instant::now(),
            },
        );
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        tracing::info!("recognition cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

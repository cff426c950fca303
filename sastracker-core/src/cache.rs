//! Single-entry feed cache.
//!
//! At most one query's results are retained, scoped to the host tab/window.
//! Starting any different search overwrites the entry wholesale; a matching
//! search restores results, page and scroll offset without a network call.
//! The cache is an explicit object the host creates once and injects into each
//! `QuestionFeed`, so tests get isolated instances instead of module state.

use parking_lot::Mutex;

use crate::interface::QuestionCard;

#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    pub query_key: String,
    pub cards: Vec<QuestionCard>,
    pub page: u32,
    pub has_more: bool,
    pub scroll_position: f64,
    /// Complete pre-ranked result set of a keyword search, kept so "load more"
    /// can keep slicing without re-running the RPC. None for structured queries.
    pub full_set: Option<Vec<QuestionCard>>,
}

/// Last-write-wins memoization of the most recent query.
#[derive(Default, uniffi::Object)]
pub struct FeedCache {
    entry: Mutex<Option<CacheEntry>>,
}

#[uniffi::export]
impl FeedCache {
    #[uniffi::constructor]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the cached entry, e.g. on sign-out.
    pub fn clear(&self) {
        *self.entry.lock() = None;
    }
}

impl FeedCache {
    /// Restore the entry for `query_key`, if it is the one cached and holds data.
    pub fn restore(&self, query_key: &str) -> Option<CacheEntry> {
        let guard = self.entry.lock();
        guard
            .as_ref()
            .filter(|e| e.query_key == query_key && !e.cards.is_empty())
            .cloned()
    }

    /// Overwrite the cache wholesale with a new search's first page.
    pub fn store(&self, entry: CacheEntry) {
        *self.entry.lock() = Some(entry);
    }

    /// Update data and page counters in place after a "load more", keeping the
    /// key and scroll offset. Ignored if a different query took the slot since.
    pub fn extend(&self, query_key: &str, cards: Vec<QuestionCard>, page: u32, has_more: bool) {
        let mut guard = self.entry.lock();
        if let Some(entry) = guard.as_mut() {
            if entry.query_key == query_key {
                entry.cards = cards;
                entry.page = page;
                entry.has_more = has_more;
            }
        }
    }

    /// Record where the user was before navigating away to a detail view.
    pub fn record_scroll(&self, query_key: &str, position: f64) {
        let mut guard = self.entry.lock();
        if let Some(entry) = guard.as_mut() {
            if entry.query_key == query_key {
                entry.scroll_position = position;
            }
        }
    }

    pub fn cached_key(&self) -> Option<String> {
        self.entry.lock().as_ref().map(|e| e.query_key.clone())
    }
}

//! QuestionFeed - Main API for host-UI interop, designed for UniFFI export.
//!
//! Owns the search state machine of the question bank landing feed: structured
//! filters, free-text search, the optional group-by dimension and pagination.
//! The URL is the durable representation of this state; hosts push `url_query`
//! output after every interaction and feed navigation changes back in through
//! `apply_url`.
//!
//! Two fetch paths: a keyword RPC returning a complete pre-ranked set that is
//! sliced client-side, and a structured filtered query fetched in fixed pages.
//! A single-entry injected cache restores the previous query (back-navigation)
//! without a fetch. Every fetch is tagged with a generation counter; responses
//! that lost the race to a newer search are discarded instead of clobbering
//! fresher state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::backend::{QuestionBackend, SupabaseBackend};
use crate::cache::{CacheEntry, FeedCache};
use crate::interface::{
    BackendConfig, FeedError, FeedSnapshot, FilterState, GroupDimension, QuestionCard,
    QuestionFeedApi, SearchQuery, TagField,
};
use crate::models::flatten_row;
use crate::query::{QueryPlan, PAGE_SIZE};
use crate::urlstate;

/// Global fallback Tokio runtime for when async functions are called outside any
/// runtime context. Shared across all QuestionFeed instances and never dropped.
/// Used by UniFFI which doesn't provide a tokio runtime.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// Academic year options offered by the filter UI.
pub const ACADEMIC_YEARS: [&str; 4] =
    ["First Year", "Second Year", "Third Year", "Fourth Year"];

/// Exam categories offered by the filter UI.
pub const EXAM_TYPES: [&str; 6] =
    ["CIA - 1", "CIA - 2", "CIA - 3", "End Sem", "Lab Cia", "End Sem Lab"];

#[uniffi::export]
pub fn academic_year_options() -> Vec<String> {
    ACADEMIC_YEARS.iter().map(|s| s.to_string()).collect()
}

#[uniffi::export]
pub fn exam_type_options() -> Vec<String> {
    EXAM_TYPES.iter().map(|s| s.to_string()).collect()
}

/// Feed state as a tagged union: either browsing the default paper listing or
/// showing results for exactly one query. A "searching" state without a query
/// is unrepresentable.
enum FeedMode {
    Browsing,
    Searching {
        query: SearchQuery,
        cards: Vec<QuestionCard>,
        page: u32,
        has_more: bool,
        /// Complete keyword-search result set, kept for client-side slicing.
        full_set: Option<Vec<QuestionCard>>,
        /// Non-zero only when this state was restored from cache.
        scroll_position: f64,
    },
}

/// The question feed controller.
///
/// Concurrency model: state sits behind a mutex that is never held across an
/// await; backend futures run on the host's runtime when there is one, else on
/// the global fallback runtime. Overlapping fetches are resolved by the
/// generation counter, last started wins.
#[derive(uniffi::Object)]
pub struct QuestionFeed {
    backend: Arc<dyn QuestionBackend>,
    cache: Arc<FeedCache>,
    state: Mutex<FeedMode>,
    generation: AtomicU64,
}

#[uniffi::export]
impl QuestionFeed {
    /// Create a feed backed by the hosted question store.
    #[uniffi::constructor]
    pub fn new(config: BackendConfig, cache: Arc<FeedCache>) -> Result<Self, FeedError> {
        let backend = SupabaseBackend::new(config)?;
        Ok(Self::with_backend(Arc::new(backend), cache))
    }
}

// Internal implementation (not exported via FFI)
impl QuestionFeed {
    /// Create a feed over any backend implementation. Used by tests to inject
    /// mock backends.
    pub fn with_backend(backend: Arc<dyn QuestionBackend>, cache: Arc<FeedCache>) -> Self {
        Self {
            backend,
            cache,
            state: Mutex::new(FeedMode::Browsing),
            generation: AtomicU64::new(0),
        }
    }

    /// Get a tokio runtime handle - uses current runtime if available, otherwise global fallback
    fn runtime_handle(&self) -> tokio::runtime::Handle {
        tokio::runtime::Handle::try_current()
            .unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
    }

    fn snapshot_now(&self) -> FeedSnapshot {
        let guard = self.state.lock();
        match &*guard {
            FeedMode::Browsing => FeedSnapshot {
                searching: false,
                query: SearchQuery::default(),
                questions: Vec::new(),
                page: 0,
                has_more: false,
                scroll_position: 0.0,
            },
            FeedMode::Searching { query, cards, page, has_more, scroll_position, .. } => {
                FeedSnapshot {
                    searching: true,
                    query: query.clone(),
                    questions: cards.clone(),
                    page: *page,
                    has_more: *has_more,
                    scroll_position: *scroll_position,
                }
            }
        }
    }

    /// Fetch one page for `query`. Returns the page cards, the new `has_more`
    /// flag and, on the keyword path, the complete set for later slicing.
    /// None means the backend failed; the caller leaves state untouched.
    async fn fetch_page(
        &self,
        query: &SearchQuery,
        page_index: u32,
        reusable_set: Option<Vec<QuestionCard>>,
    ) -> Option<(Vec<QuestionCard>, bool, Option<Vec<QuestionCard>>)> {
        if !query.text.is_empty() {
            let full = match reusable_set {
                Some(set) => set,
                None => {
                    let keyword = query.text.clone();
                    let backend = Arc::clone(&self.backend);
                    let handle = self
                        .runtime_handle()
                        .spawn(async move { backend.keyword_search(&keyword).await });
                    match handle.await {
                        Ok(Ok(rows)) => rows.into_iter().map(flatten_row).collect::<Vec<_>>(),
                        Ok(Err(err)) => {
                            tracing::warn!(%err, "keyword search failed, keeping previous state");
                            return None;
                        }
                        Err(_) => {
                            tracing::warn!("keyword search task aborted");
                            return None;
                        }
                    }
                }
            };

            let from = page_index as usize * PAGE_SIZE as usize;
            let to = (from + PAGE_SIZE as usize).min(full.len());
            let slice = if from < full.len() { full[from..to].to_vec() } else { Vec::new() };
            let has_more = to < full.len();
            Some((slice, has_more, Some(full)))
        } else {
            let plan = QueryPlan::build(query, page_index);
            let backend = Arc::clone(&self.backend);
            let handle = self
                .runtime_handle()
                .spawn(async move { backend.fetch_questions(&plan).await });
            match handle.await {
                Ok(Ok(rows)) => {
                    let has_more = rows.len() as u32 == PAGE_SIZE;
                    let cards = rows.into_iter().map(flatten_row).collect();
                    Some((cards, has_more, None))
                }
                Ok(Err(err)) => {
                    tracing::warn!(%err, "structured query failed, keeping previous state");
                    None
                }
                Err(_) => {
                    tracing::warn!("structured query task aborted");
                    None
                }
            }
        }
    }

    async fn run_search(&self, query: SearchQuery, is_new: bool) -> FeedSnapshot {
        let key = query.cache_key();
        // Every search entry claims a new generation; any fetch still in flight
        // for an older one becomes stale.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut reusable_set = None;
        let page_index = if is_new {
            if query.is_empty() {
                *self.state.lock() = FeedMode::Browsing;
                return self.snapshot_now();
            }

            if let Some(entry) = self.cache.restore(&key) {
                tracing::debug!("restoring feed from cache, no fetch");
                *self.state.lock() = FeedMode::Searching {
                    query: query.clone(),
                    cards: entry.cards,
                    page: entry.page,
                    has_more: entry.has_more,
                    full_set: entry.full_set,
                    scroll_position: entry.scroll_position,
                };
                return self.snapshot_now();
            }
            0
        } else {
            let continuation = {
                let guard = self.state.lock();
                match &*guard {
                    FeedMode::Searching { page, full_set, .. } => Some((*page, full_set.clone())),
                    FeedMode::Browsing => None,
                }
            };
            match continuation {
                Some((page, full_set)) => {
                    reusable_set = full_set;
                    page
                }
                None => return self.snapshot_now(),
            }
        };

        let fetched = self.fetch_page(&query, page_index, reusable_set).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("discarding stale search response");
            return self.snapshot_now();
        }

        let Some((page_cards, has_more, full_set)) = fetched else {
            // Fail silent: no partial update, the UI keeps what it has.
            return self.snapshot_now();
        };

        let mut guard = self.state.lock();
        if is_new {
            *guard = FeedMode::Searching {
                query: query.clone(),
                cards: page_cards.clone(),
                page: 1,
                has_more,
                full_set: full_set.clone(),
                scroll_position: 0.0,
            };
            self.cache.store(CacheEntry {
                query_key: key,
                cards: page_cards,
                page: 1,
                has_more,
                scroll_position: 0.0,
                full_set,
            });
        } else if let FeedMode::Searching { cards, page, has_more: active_has_more, .. } =
            &mut *guard
        {
            cards.extend(page_cards);
            *page += 1;
            *active_has_more = has_more;
            self.cache.extend(&key, cards.clone(), *page, has_more);
        }
        drop(guard);

        self.snapshot_now()
    }
}

#[uniffi::export]
#[async_trait::async_trait]
impl QuestionFeedApi for QuestionFeed {
    async fn submit(&self, query: SearchQuery) -> FeedSnapshot {
        self.run_search(query, true).await
    }

    async fn load_more(&self) -> FeedSnapshot {
        let continuation = {
            let guard = self.state.lock();
            match &*guard {
                FeedMode::Searching { query, has_more, .. } if *has_more => Some(query.clone()),
                _ => None,
            }
        };
        match continuation {
            Some(query) => self.run_search(query, false).await,
            None => self.snapshot_now(),
        }
    }

    async fn tag_click(&self, field: TagField, value: String) -> FeedSnapshot {
        let mut filters = FilterState::default();
        match field {
            TagField::Year => filters.year = value,
            TagField::Subject => filters.subject = value,
            TagField::ExamType => filters.exam_type = value,
            TagField::ExamYear => filters.exam_year = value,
        }
        let query = SearchQuery { text: String::new(), filters, group: GroupDimension::None };
        self.run_search(query, true).await
    }

    async fn apply_url(&self, query_string: String) -> FeedSnapshot {
        self.run_search(urlstate::parse_query_string(&query_string), true).await
    }

    fn url_query(&self) -> String {
        let guard = self.state.lock();
        match &*guard {
            FeedMode::Browsing => String::new(),
            FeedMode::Searching { query, .. } => urlstate::to_query_string(query),
        }
    }

    fn back_to_browse(&self) -> FeedSnapshot {
        *self.state.lock() = FeedMode::Browsing;
        self.snapshot_now()
    }

    fn record_scroll_position(&self, position: f64) {
        let key = {
            let guard = self.state.lock();
            match &*guard {
                FeedMode::Searching { query, .. } => Some(query.cache_key()),
                FeedMode::Browsing => None,
            }
        };
        if let Some(key) = key {
            self.cache.record_scroll(&key, position);
        }
    }

    fn snapshot(&self) -> FeedSnapshot {
        self.snapshot_now()
    }

    async fn subjects_for_year(&self, academic_year: String) -> Vec<String> {
        let backend = Arc::clone(&self.backend);
        let handle = self
            .runtime_handle()
            .spawn(async move { backend.subjects_for_year(&academic_year).await });
        match handle.await {
            Ok(Ok(subjects)) => subjects,
            Ok(Err(err)) => {
                tracing::warn!(%err, "subject listing failed");
                Vec::new()
            }
            Err(_) => Vec::new(),
        }
    }
}

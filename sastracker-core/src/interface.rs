//! SASTRACKER FFI Interface Definition
//!
//! This file defines the public interface exposed to the rendering layer via UniFFI.
//! It acts as the source of truth for shared types: the feed only hands the UI
//! flattened `QuestionCard` rows and `FeedSnapshot` views, never raw backend rows.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// The dimension the feed is grouped by.
///
/// When a dimension is active, the matching filter field is suppressed from the
/// query and results are ordered by that column instead; the rendering layer
/// inserts a section header whenever the grouped value changes between
/// consecutive cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum GroupDimension {
    #[default]
    None,
    Year,
    Subject,
    ExamType,
    ExamYear,
}

impl GroupDimension {
    /// URL parameter value for this dimension (`group=...`), None when ungrouped.
    pub fn url_value(self) -> Option<&'static str> {
        match self {
            GroupDimension::None => None,
            GroupDimension::Year => Some("year"),
            GroupDimension::Subject => Some("subject"),
            GroupDimension::ExamType => Some("exam"),
            GroupDimension::ExamYear => Some("date"),
        }
    }

    /// Parse a `group` URL parameter. Unknown values fall back to ungrouped.
    pub fn from_url_value(value: &str) -> Self {
        match value {
            "year" => GroupDimension::Year,
            "subject" => GroupDimension::Subject,
            "exam" => GroupDimension::ExamType,
            "date" => GroupDimension::ExamYear,
            _ => GroupDimension::None,
        }
    }
}

/// Metadata tag on a question card the user can click to drill down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum TagField {
    Year,
    Subject,
    ExamType,
    ExamYear,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// Structured filters over the question bank.
///
/// Empty string means "unset". `subject` is only meaningful once `year` is set
/// (subject options are fetched per academic year via `subjects_for_year`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct FilterState {
    pub year: String,
    pub subject: String,
    pub exam_type: String,
    pub exam_year: String,
    pub marks: String,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.year.is_empty()
            && self.subject.is_empty()
            && self.exam_type.is_empty()
            && self.exam_year.is_empty()
            && self.marks.is_empty()
    }
}

/// The full addressable search state: free text, structured filters, grouping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, uniffi::Record)]
pub struct SearchQuery {
    pub text: String,
    pub filters: FilterState,
    pub group: GroupDimension,
}

impl SearchQuery {
    /// An entirely empty query means "browse mode", no fetch is issued for it.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.filters.is_empty() && self.group == GroupDimension::None
    }

    /// Deterministic cache key: stable field order, independent of how the
    /// query was constructed.
    pub fn cache_key(&self) -> String {
        format!(
            "q={}|year={}|subject={}|exam={}|date={}|marks={}|group={:?}",
            self.text,
            self.filters.year,
            self.filters.subject,
            self.filters.exam_type,
            self.filters.exam_year,
            self.filters.marks,
            self.group,
        )
    }
}

/// A question row flattened for uniform rendering regardless of fetch path.
///
/// Paper-level metadata (academic year, subject, exam type, exam year) is hoisted
/// onto the card by `models::flatten_row`, so the UI never touches the join shape.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct QuestionCard {
    pub id: String,
    pub paper_id: String,
    pub question_number: i64,
    /// Question body, LaTeX source passed through untouched.
    pub content: String,
    pub image_path: Option<String>,
    pub marks: i64,
    pub academic_year: String,
    pub subject: String,
    pub exam_type: String,
    pub exam_year: String,
    pub avg_rating: f64,
    pub is_ai_answered: bool,
}

impl QuestionCard {
    /// The value of this card along a group dimension, for section headers.
    pub fn group_value(&self, dimension: GroupDimension) -> Option<&str> {
        match dimension {
            GroupDimension::None => None,
            GroupDimension::Year => Some(&self.academic_year),
            GroupDimension::Subject => Some(&self.subject),
            GroupDimension::ExamType => Some(&self.exam_type),
            GroupDimension::ExamYear => Some(&self.exam_year),
        }
    }
}

/// Snapshot of the feed for the rendering layer.
///
/// `searching == false` is browse mode: the UI shows its default paper listing
/// and `questions` is empty. `scroll_position` is only non-zero when the
/// snapshot was restored from cache after returning from a detail view.
#[derive(Debug, Clone, PartialEq, uniffi::Record)]
pub struct FeedSnapshot {
    pub searching: bool,
    pub query: SearchQuery,
    pub questions: Vec<QuestionCard>,
    pub page: u32,
    pub has_more: bool,
    pub scroll_position: f64,
}

/// Connection settings for the hosted backend.
#[derive(Debug, Clone, uniffi::Record)]
pub struct BackendConfig {
    pub base_url: String,
    pub anon_key: String,
}

/// Error type for feed operations
#[derive(Debug, Error, uniffi::Error)]
pub enum FeedError {
    #[error("Backend error: {0}")]
    Backend(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Operation cancelled")]
    Cancelled,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// The primary interface for driving the question feed.
/// This matches the functionality exposed by the `QuestionFeed` object.
#[uniffi::export(with_foreign)]
#[async_trait::async_trait]
pub trait QuestionFeedApi: Send + Sync {
    /// Run a fresh search. An entirely empty query drops back to browse mode
    /// without touching the network; a query matching the cached one restores
    /// the cached results without a fetch.
    async fn submit(&self, query: SearchQuery) -> FeedSnapshot;

    /// Fetch the next page of the active query and append it. No-op in browse mode.
    async fn load_more(&self) -> FeedSnapshot;

    /// One-click drill-down from a card tag: replaces the entire query with a
    /// single filter on `field`, clearing text and grouping.
    async fn tag_click(&self, field: TagField, value: String) -> FeedSnapshot;

    /// Re-derive the query from a URL query string and run it as a new search.
    /// The URL is the single source of truth on navigation (mount, back/forward).
    async fn apply_url(&self, query_string: String) -> FeedSnapshot;

    /// Serialize the active query to URL parameters for the host to push.
    fn url_query(&self) -> String;

    /// Explicit "back to papers": clears filters, text and grouping.
    fn back_to_browse(&self) -> FeedSnapshot;

    /// Record the scroll offset before navigating to a detail view, so a cache
    /// hit on return can restore it.
    fn record_scroll_position(&self, position: f64);

    /// Current feed state without side effects.
    fn snapshot(&self) -> FeedSnapshot;

    /// Subject dropdown options for the selected academic year.
    /// Returns an empty list on backend failure.
    async fn subjects_for_year(&self, academic_year: String) -> Vec<String>;
}

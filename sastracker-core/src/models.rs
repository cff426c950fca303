//! Raw backend row types and the flatten step.
//!
//! The two fetch paths return differently shaped rows: the structured query
//! nests paper metadata under `papers`, the keyword RPC returns it already
//! flattened. `flatten_row` is the single typed mapping from either shape to
//! the `QuestionCard` the UI renders.

use serde::Deserialize;

use crate::interface::QuestionCard;

/// A year column that some deployments store as integer and the RPC returns
/// as text. Normalized to a string for filtering and display.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum YearValue {
    Num(i64),
    Text(String),
}

impl YearValue {
    pub fn into_string(self) -> String {
        match self {
            YearValue::Num(n) => n.to_string(),
            YearValue::Text(s) => s,
        }
    }
}

/// Paper metadata joined onto a question row by the structured query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaperMeta {
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub exam_type: Option<String>,
    #[serde(default)]
    pub exam_year: Option<YearValue>,
}

/// Reference to a linked AI answer row. Only its presence matters.
#[derive(Debug, Clone, Deserialize)]
pub struct AiAnswerRef {
    #[serde(default)]
    pub id: Option<String>,
}

/// A question row as returned by the backend, before flattening.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestionRow {
    pub id: String,
    #[serde(default)]
    pub paper_id: Option<String>,
    #[serde(default)]
    pub question_number: Option<i64>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub marks: Option<i64>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
    /// Precomputed flag, set by the RPC path.
    #[serde(default)]
    pub is_ai_answered: Option<bool>,
    /// Linked AI answers, selected by the structured path when the flag is absent.
    #[serde(default)]
    pub ai_answers: Option<Vec<AiAnswerRef>>,
    // Paper fields directly on the row (RPC path).
    #[serde(default)]
    pub academic_year: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub exam_type: Option<String>,
    #[serde(default)]
    pub exam_year: Option<YearValue>,
    // Nested paper metadata (structured path).
    #[serde(default)]
    pub papers: Option<PaperMeta>,
}

/// Flatten a raw row into a view card.
///
/// Paper fields already present on the row take precedence over the nested
/// join; `avg_rating` defaults to 0; `is_ai_answered` falls back to "has at
/// least one linked AI answer".
pub fn flatten_row(raw: RawQuestionRow) -> QuestionCard {
    let paper = raw.papers.unwrap_or_default();

    let is_ai_answered = raw
        .is_ai_answered
        .unwrap_or_else(|| raw.ai_answers.as_ref().is_some_and(|a| !a.is_empty()));

    QuestionCard {
        id: raw.id,
        paper_id: raw.paper_id.unwrap_or_default(),
        question_number: raw.question_number.unwrap_or_default(),
        content: raw.content,
        image_path: raw.image_path,
        marks: raw.marks.unwrap_or_default(),
        academic_year: raw
            .academic_year
            .or(paper.academic_year)
            .unwrap_or_default(),
        subject: raw.subject.or(paper.subject).unwrap_or_default(),
        exam_type: raw.exam_type.or(paper.exam_type).unwrap_or_default(),
        exam_year: raw
            .exam_year
            .or(paper.exam_year)
            .map(YearValue::into_string)
            .unwrap_or_default(),
        avg_rating: raw.avg_rating.unwrap_or(0.0),
        is_ai_answered,
    }
}

//! Structured query plan composition.
//!
//! Translates a `SearchQuery` into the constraints, ordering and paging window
//! the backend executes, and renders the plan as PostgREST parameters. Grouping
//! takes precedence over filtering: the filter on the grouped dimension is
//! suppressed and replaced by an `ORDER BY` on that column.

use crate::interface::{GroupDimension, SearchQuery};

/// Fixed page size for both fetch paths.
pub const PAGE_SIZE: u32 = 10;

/// Embedded select clause: questions joined to their paper metadata plus the
/// linked AI answer ids used to derive the answered flag.
const SELECT_CLAUSE: &str =
    "*,papers!inner(academic_year,subject,exam_type,exam_year),ai_answers(id)";

const COL_ACADEMIC_YEAR: &str = "papers.academic_year";
const COL_SUBJECT: &str = "papers.subject";
const COL_EXAM_TYPE: &str = "papers.exam_type";
const COL_EXAM_YEAR: &str = "papers.exam_year";
const COL_MARKS: &str = "marks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    /// Case-insensitive substring match.
    ILike,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub column: &'static str,
    pub op: FilterOp,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub ascending: bool,
}

/// One executable page of a structured query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub constraints: Vec<Constraint>,
    pub order: Option<OrderBy>,
    /// Zero-based row offset of the page.
    pub offset: u32,
    pub limit: u32,
}

impl QueryPlan {
    /// Build the plan for `page_index` of a structured query.
    pub fn build(query: &SearchQuery, page_index: u32) -> Self {
        let filters = &query.filters;
        let mut constraints = Vec::new();

        if !filters.year.is_empty() && query.group != GroupDimension::Year {
            constraints.push(Constraint {
                column: COL_ACADEMIC_YEAR,
                op: FilterOp::Eq,
                value: filters.year.clone(),
            });
        }
        if !filters.subject.is_empty() && query.group != GroupDimension::Subject {
            constraints.push(Constraint {
                column: COL_SUBJECT,
                op: FilterOp::ILike,
                value: filters.subject.clone(),
            });
        }
        if !filters.exam_type.is_empty() && query.group != GroupDimension::ExamType {
            constraints.push(Constraint {
                column: COL_EXAM_TYPE,
                op: FilterOp::Eq,
                value: filters.exam_type.clone(),
            });
        }
        if !filters.exam_year.is_empty() && query.group != GroupDimension::ExamYear {
            constraints.push(Constraint {
                column: COL_EXAM_YEAR,
                op: FilterOp::Eq,
                value: filters.exam_year.clone(),
            });
        }
        if !filters.marks.is_empty() {
            constraints.push(Constraint {
                column: COL_MARKS,
                op: FilterOp::Eq,
                value: filters.marks.clone(),
            });
        }

        // Ascending by the grouped column; exam year groups newest first.
        let order = match query.group {
            GroupDimension::None => None,
            GroupDimension::Year => Some(OrderBy { column: COL_ACADEMIC_YEAR, ascending: true }),
            GroupDimension::Subject => Some(OrderBy { column: COL_SUBJECT, ascending: true }),
            GroupDimension::ExamType => Some(OrderBy { column: COL_EXAM_TYPE, ascending: true }),
            GroupDimension::ExamYear => Some(OrderBy { column: COL_EXAM_YEAR, ascending: false }),
        };

        QueryPlan {
            constraints,
            order,
            offset: page_index * PAGE_SIZE,
            limit: PAGE_SIZE,
        }
    }

    /// Whether the plan filters on a column at all (any operator).
    pub fn filters_on(&self, column: &str) -> bool {
        self.constraints.iter().any(|c| c.column == column)
    }

    /// Render as PostgREST query parameters for the `questions` endpoint.
    pub fn to_postgrest_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), SELECT_CLAUSE.to_string())];

        for c in &self.constraints {
            let rendered = match c.op {
                FilterOp::Eq => format!("eq.{}", c.value),
                FilterOp::ILike => format!("ilike.*{}*", c.value),
            };
            params.push((c.column.to_string(), rendered));
        }

        if let Some(order) = self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            // Embedded-resource columns order as `papers(col)`, own columns as `col`.
            let column = match order.column.split_once('.') {
                Some((table, col)) => format!("{table}({col})"),
                None => order.column.to_string(),
            };
            params.push(("order".to_string(), format!("{column}.{direction}")));
        }

        params.push(("offset".to_string(), self.offset.to_string()));
        params.push(("limit".to_string(), self.limit.to_string()));
        params
    }
}

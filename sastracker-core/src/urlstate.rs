//! URL query-string round trip.
//!
//! The URL is the durable representation of the feed state: the host pushes
//! `to_query_string` output on every search, and re-derives the query with
//! `parse_query_string` on mount and on back/forward navigation.
//!
//! Serialization rules:
//! - Non-empty search text supersedes structured filters entirely: only `q`
//!   and `group` are written.
//! - `exam`/`date` are omitted when they equal the active group dimension,
//!   since grouping overrides filtering on that field.

use url::form_urlencoded;

use crate::interface::{FilterState, GroupDimension, SearchQuery};

pub fn to_query_string(query: &SearchQuery) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if !query.text.is_empty() {
        serializer.append_pair("q", &query.text);
        if let Some(group) = query.group.url_value() {
            serializer.append_pair("group", group);
        }
        return serializer.finish();
    }

    let filters = &query.filters;
    if !filters.year.is_empty() {
        serializer.append_pair("year", &filters.year);
    }
    if !filters.subject.is_empty() {
        serializer.append_pair("subject", &filters.subject);
    }
    if !filters.exam_type.is_empty() && query.group != GroupDimension::ExamType {
        serializer.append_pair("exam", &filters.exam_type);
    }
    if !filters.exam_year.is_empty() && query.group != GroupDimension::ExamYear {
        serializer.append_pair("date", &filters.exam_year);
    }
    if !filters.marks.is_empty() {
        serializer.append_pair("marks", &filters.marks);
    }
    if let Some(group) = query.group.url_value() {
        serializer.append_pair("group", group);
    }

    serializer.finish()
}

/// Parse URL query parameters back into a `SearchQuery`.
/// Absent parameters mean "unset"; unknown parameters are ignored.
pub fn parse_query_string(query_string: &str) -> SearchQuery {
    let trimmed = query_string.trim_start_matches('?');
    let mut query = SearchQuery::default();

    for (key, value) in form_urlencoded::parse(trimmed.as_bytes()) {
        match key.as_ref() {
            "q" => query.text = value.into_owned(),
            "group" => query.group = GroupDimension::from_url_value(&value),
            "year" => query.filters.year = value.into_owned(),
            "subject" => query.filters.subject = value.into_owned(),
            "exam" => query.filters.exam_type = value.into_owned(),
            "date" => query.filters.exam_year = value.into_owned(),
            "marks" => query.filters.marks = value.into_owned(),
            _ => {}
        }
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_query_round_trips() {
        let query = SearchQuery {
            text: String::new(),
            filters: FilterState {
                year: "First Year".into(),
                subject: String::new(),
                exam_type: "CIA - 1".into(),
                exam_year: "2023".into(),
                marks: String::new(),
            },
            group: GroupDimension::None,
        };

        let reparsed = parse_query_string(&to_query_string(&query));
        assert_eq!(reparsed, query);
    }

    #[test]
    fn text_supersedes_structured_filters() {
        let query = SearchQuery {
            text: "fourier transform".into(),
            filters: FilterState {
                year: "Third Year".into(),
                subject: "Signals".into(),
                exam_type: "End Sem".into(),
                exam_year: "2022".into(),
                marks: "16".into(),
            },
            group: GroupDimension::Subject,
        };

        let qs = to_query_string(&query);
        assert!(qs.contains("q=fourier"));
        assert!(qs.contains("group=subject"));
        for dropped in ["year=", "subject=Signals", "exam=", "date=", "marks="] {
            assert!(!qs.contains(dropped), "{dropped} should be dropped: {qs}");
        }

        let reparsed = parse_query_string(&qs);
        assert_eq!(reparsed.text, query.text);
        assert_eq!(reparsed.group, GroupDimension::Subject);
        assert!(reparsed.filters.is_empty());
    }

    #[test]
    fn grouped_dimension_filter_is_omitted() {
        let query = SearchQuery {
            text: String::new(),
            filters: FilterState {
                exam_type: "CIA - 1".into(),
                exam_year: "2023".into(),
                ..Default::default()
            },
            group: GroupDimension::ExamType,
        };

        let qs = to_query_string(&query);
        assert!(!qs.contains("exam="));
        assert!(qs.contains("date=2023"));
        assert!(qs.contains("group=exam"));
    }

    #[test]
    fn parse_handles_leading_question_mark_and_encoding() {
        let query = parse_query_string("?year=First+Year&exam=CIA+-+1&marks=8");
        assert_eq!(query.filters.year, "First Year");
        assert_eq!(query.filters.exam_type, "CIA - 1");
        assert_eq!(query.filters.marks, "8");
        assert_eq!(query.group, GroupDimension::None);
    }

    #[test]
    fn unknown_parameters_are_ignored() {
        let query = parse_query_string("year=First+Year&utm_source=share&group=bogus");
        assert_eq!(query.filters.year, "First Year");
        assert_eq!(query.group, GroupDimension::None);
    }

    #[test]
    fn empty_query_serializes_to_empty_string() {
        assert_eq!(to_query_string(&SearchQuery::default()), "");
        assert!(parse_query_string("").is_empty());
    }
}

//! Backend seam for the question store.
//!
//! The feed only ever talks to the `QuestionBackend` trait: a keyword-search
//! remote procedure returning a complete pre-ranked set, a structured filtered
//! query over questions joined to papers, and the per-year subject listing.
//! `SupabaseBackend` implements it over the hosted PostgREST API; tests inject
//! their own implementation.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use url::Url;

use crate::interface::{BackendConfig, FeedError};
use crate::models::RawQuestionRow;
use crate::query::QueryPlan;

/// Name of the keyword-search stored procedure.
const SEARCH_RPC: &str = "search_questions";

#[async_trait]
pub trait QuestionBackend: Send + Sync {
    /// Full-text keyword search. Returns the complete result set, already
    /// ranked by the backend; the caller paginates it client-side.
    async fn keyword_search(&self, keyword: &str) -> Result<Vec<RawQuestionRow>, FeedError>;

    /// Execute one page of a structured filtered query.
    async fn fetch_questions(&self, plan: &QueryPlan) -> Result<Vec<RawQuestionRow>, FeedError>;

    /// Subject names offered for an academic year.
    async fn subjects_for_year(&self, academic_year: &str) -> Result<Vec<String>, FeedError>;
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Backend(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct SubjectRow {
    subject_name: String,
}

/// PostgREST-backed implementation of the question store.
pub struct SupabaseBackend {
    client: reqwest::Client,
    base_url: String,
}

impl SupabaseBackend {
    pub fn new(config: BackendConfig) -> Result<Self, FeedError> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| FeedError::InvalidConfig(format!("base_url: {e}")))?;
        if config.anon_key.is_empty() {
            return Err(FeedError::InvalidConfig("anon_key is empty".into()));
        }

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.anon_key)
            .map_err(|e| FeedError::InvalidConfig(format!("anon_key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.anon_key))
            .map_err(|e| FeedError::InvalidConfig(format!("anon_key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }
}

#[async_trait]
impl QuestionBackend for SupabaseBackend {
    async fn keyword_search(&self, keyword: &str) -> Result<Vec<RawQuestionRow>, FeedError> {
        tracing::debug!(keyword, "dispatching keyword search rpc");
        let rows = self
            .client
            .post(self.rest_url(&format!("rpc/{SEARCH_RPC}")))
            .json(&serde_json::json!({ "keyword": keyword }))
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawQuestionRow>>()
            .await?;
        Ok(rows)
    }

    async fn fetch_questions(&self, plan: &QueryPlan) -> Result<Vec<RawQuestionRow>, FeedError> {
        tracing::debug!(offset = plan.offset, constraints = plan.constraints.len(), "dispatching structured query");
        let rows = self
            .client
            .get(self.rest_url("questions"))
            .query(&plan.to_postgrest_params())
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<RawQuestionRow>>()
            .await?;
        Ok(rows)
    }

    async fn subjects_for_year(&self, academic_year: &str) -> Result<Vec<String>, FeedError> {
        let rows = self
            .client
            .get(self.rest_url("subjects"))
            .query(&[
                ("select", "subject_name"),
                ("academic_year", &format!("eq.{academic_year}")),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<SubjectRow>>()
            .await?;
        Ok(rows.into_iter().map(|r| r.subject_name).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_base_url() {
        let result = SupabaseBackend::new(BackendConfig {
            base_url: "not a url".into(),
            anon_key: "key".into(),
        });
        assert!(matches!(result, Err(FeedError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_empty_anon_key() {
        let result = SupabaseBackend::new(BackendConfig {
            base_url: "https://example.supabase.co".into(),
            anon_key: String::new(),
        });
        assert!(matches!(result, Err(FeedError::InvalidConfig(_))));
    }

    #[test]
    fn rest_urls_are_rooted_at_the_project() {
        let backend = SupabaseBackend::new(BackendConfig {
            base_url: "https://example.supabase.co/".into(),
            anon_key: "key".into(),
        })
        .unwrap();
        assert_eq!(
            backend.rest_url("questions"),
            "https://example.supabase.co/rest/v1/questions"
        );
        assert_eq!(
            backend.rest_url("rpc/search_questions"),
            "https://example.supabase.co/rest/v1/rpc/search_questions"
        );
    }
}

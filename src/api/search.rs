//! Full-text search endpoints.

use reqwest::Method;

use crate::models::{ArticleStatus, ArticleSummary, PopularSearches, SearchSuggestions};

use super::client::ApiClient;
use super::ApiError;

/// A full-text search. Only the query string is required.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub q: String,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ArticleStatus>,
    /// Author username.
    pub author: Option<String>,
}

impl SearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            skip: None,
            limit: None,
            status: None,
            author: None,
        }
    }
}

impl ApiClient {
    /// Search article titles and bodies.
    pub async fn search_articles(&self, query: &SearchQuery) -> Result<Vec<ArticleSummary>, ApiError> {
        self.request_json(
            self.request(Method::GET, "/search/")
                .query("q", &query.q)
                .query_opt("skip", query.skip)
                .query_opt("limit", query.limit)
                .query_opt("status", query.status)
                .query_opt("author", query.author.as_deref()),
        )
        .await
    }

    /// Completions for a partial query.
    pub async fn search_suggestions(
        &self,
        q: &str,
        limit: Option<u32>,
    ) -> Result<SearchSuggestions, ApiError> {
        self.request_json(
            self.request(Method::GET, "/search/suggestions")
                .query("q", q)
                .query_opt("limit", limit),
        )
        .await
    }

    /// The keywords that appear most across article titles.
    pub async fn popular_searches(&self, limit: Option<u32>) -> Result<PopularSearches, ApiError> {
        self.request_json(self.request(Method::GET, "/search/popular").query_opt("limit", limit))
            .await
    }
}

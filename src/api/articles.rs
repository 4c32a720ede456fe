//! Article endpoints.

use reqwest::Method;
use serde_json::json;

use crate::models::{Article, ArticleDetail, ArticleDraft, ArticleStatus, ArticleSummary, ArticleUpdate};

use super::client::ApiClient;
use super::ApiError;

/// Filters for the article listing. All fields are optional; the backend
/// defaults to the ten newest articles of any status.
#[derive(Debug, Clone, Default)]
pub struct ArticleQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ArticleStatus>,
    /// Exact tag name.
    pub tag: Option<String>,
    /// Substring match against title and content.
    pub search: Option<String>,
    /// Author username.
    pub author: Option<String>,
}

impl ArticleQuery {
    pub fn published() -> Self {
        Self {
            status: Some(ArticleStatus::Published),
            ..Self::default()
        }
    }
}

impl ApiClient {
    pub async fn list_articles(&self, query: &ArticleQuery) -> Result<Vec<ArticleSummary>, ApiError> {
        self.request_json(
            self.request(Method::GET, "/articles/")
                .query_opt("skip", query.skip)
                .query_opt("limit", query.limit)
                .query_opt("status", query.status)
                .query_opt("tag", query.tag.as_deref())
                .query_opt("search", query.search.as_deref())
                .query_opt("author", query.author.as_deref()),
        )
        .await
    }

    /// Fetch one article with its body and comments. Also bumps the
    /// backend's view counter.
    pub async fn get_article(&self, article_id: i64) -> Result<ArticleDetail, ApiError> {
        self.request_json(self.request(Method::GET, &format!("/articles/{article_id}")))
            .await
    }

    pub async fn create_article(&self, draft: &ArticleDraft) -> Result<Article, ApiError> {
        self.request_json(self.request(Method::POST, "/articles/").json(json!(draft)))
            .await
    }

    /// Update an article. Fields left `None` in `update` keep their
    /// current values.
    pub async fn update_article(
        &self,
        article_id: i64,
        update: &ArticleUpdate,
    ) -> Result<Article, ApiError> {
        self.request_json(
            self.request(Method::PUT, &format!("/articles/{article_id}"))
                .json(json!(update)),
        )
        .await
    }

    pub async fn delete_article(&self, article_id: i64) -> Result<(), ApiError> {
        self.request_unit(self.request(Method::DELETE, &format!("/articles/{article_id}")))
            .await
    }
}

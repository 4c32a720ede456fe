use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::comment::CommentPreview;
use super::user::UserRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Draft,
    Published,
    Archived,
}

impl std::fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArticleStatus::Draft => write!(f, "draft"),
            ArticleStatus::Published => write!(f, "published"),
            ArticleStatus::Archived => write!(f, "archived"),
        }
    }
}

/// Tag attribution embedded in article responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagRef {
    pub id: i64,
    pub name: String,
}

/// An article as returned by the listing and search endpoints. Carries
/// the summary but not the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub status: ArticleStatus,
    pub author: UserRef,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub comment_count: i64,
}

/// An article as returned by create and update. Same shape as the list
/// entry minus the comment count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub status: ArticleStatus,
    pub author: UserRef,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub view_count: i64,
}

/// A full article with its Markdown body and top-level comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub status: ArticleStatus,
    pub author: UserRef,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    #[serde(default)]
    pub comments: Vec<CommentPreview>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(default)]
    pub view_count: i64,
}

/// Payload for creating an article.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub status: ArticleStatus,
    pub tags: Vec<String>,
    pub has_latex: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latex_content: Option<String>,
}

impl Default for ArticleDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            summary: None,
            status: ArticleStatus::Draft,
            tags: Vec::new(),
            has_latex: false,
            latex_content: None,
        }
    }
}

/// Payload for updating an article. Unset fields are left untouched
/// server-side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArticleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ArticleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_latex: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latex_content: Option<String>,
}

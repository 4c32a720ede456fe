//! Comment endpoints. Comments hang off articles; replies reference a
//! parent comment and nest in responses.

use reqwest::Method;
use serde_json::json;

use crate::models::Comment;

use super::client::ApiClient;
use super::ApiError;

impl ApiClient {
    /// Comments on an article, newest first, replies nested.
    pub async fn list_comments(
        &self,
        article_id: i64,
        skip: u32,
        limit: u32,
    ) -> Result<Vec<Comment>, ApiError> {
        self.request_json(
            self.request(Method::GET, &format!("/articles/{article_id}/comments"))
                .query("skip", skip)
                .query("limit", limit),
        )
        .await
    }

    /// Post a comment, or a reply when `parent_id` is set.
    pub async fn post_comment(
        &self,
        article_id: i64,
        content: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment, ApiError> {
        let mut body = json!({ "content": content });
        if let Some(parent_id) = parent_id {
            body["parent_id"] = json!(parent_id);
        }
        self.request_json(
            self.request(Method::POST, &format!("/articles/{article_id}/comments"))
                .json(body),
        )
        .await
    }

    /// Delete a comment. Allowed for the comment's author and admins.
    pub async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
        self.request_unit(self.request(Method::DELETE, &format!("/articles/comments/{comment_id}")))
            .await
    }
}

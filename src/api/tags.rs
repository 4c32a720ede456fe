//! Tag endpoints. Creation, update, and deletion are admin-only
//! server-side; the client surfaces the resulting `AccessDenied` as-is.

use reqwest::Method;
use serde_json::{json, Value};

use crate::models::{Tag, TagWithCount};

use super::client::ApiClient;
use super::ApiError;

impl ApiClient {
    /// All tags with their article counts, ordered by name.
    pub async fn list_tags(&self) -> Result<Vec<TagWithCount>, ApiError> {
        self.request_json(self.request(Method::GET, "/tags/")).await
    }

    /// The most-used tags, ordered by article count.
    pub async fn popular_tags(&self, limit: u32) -> Result<Vec<TagWithCount>, ApiError> {
        self.request_json(self.request(Method::GET, "/tags/popular").query("limit", limit))
            .await
    }

    pub async fn get_tag(&self, tag_id: i64) -> Result<Tag, ApiError> {
        self.request_json(self.request(Method::GET, &format!("/tags/{tag_id}")))
            .await
    }

    pub async fn create_tag(&self, name: &str, description: Option<&str>) -> Result<Tag, ApiError> {
        let mut body = json!({ "name": name });
        if let Some(description) = description {
            body["description"] = json!(description);
        }
        self.request_json(self.request(Method::POST, "/tags/").json(body))
            .await
    }

    /// Rename a tag and/or replace its description. `None` fields are
    /// left untouched.
    pub async fn update_tag(
        &self,
        tag_id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Tag, ApiError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(description) = description {
            body.insert("description".to_string(), json!(description));
        }
        self.request_json(
            self.request(Method::PUT, &format!("/tags/{tag_id}"))
                .json(Value::Object(body)),
        )
        .await
    }

    /// Delete a tag and its article associations.
    pub async fn delete_tag(&self, tag_id: i64) -> Result<(), ApiError> {
        self.request_unit(self.request(Method::DELETE, &format!("/tags/{tag_id}")))
            .await
    }
}

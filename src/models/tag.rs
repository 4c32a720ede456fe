use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// A tag with how many articles carry it, as returned by the tag listing
/// and popular-tags endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagWithCount {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub article_count: i64,
}

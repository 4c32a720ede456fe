use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::user::UserRef;

/// A comment as embedded in an article detail response. Replies are not
/// included at this level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPreview {
    pub id: i64,
    pub content: String,
    pub author: UserRef,
    pub created_at: NaiveDateTime,
    pub parent_id: Option<i64>,
}

/// A comment from the per-article comment listing. Replies nest
/// recursively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub author: UserRef,
    pub article_id: i64,
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub replies: Vec<Comment>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Comment {
    /// This comment plus everything nested under it.
    pub fn thread_len(&self) -> usize {
        1 + self.replies.iter().map(Comment::thread_len).sum::<usize>()
    }
}

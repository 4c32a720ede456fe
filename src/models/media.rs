use serde::{Deserialize, Serialize};

use super::user::UserRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Pdf,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Pdf => write!(f, "pdf"),
        }
    }
}

/// An uploaded file from the media listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: i64,
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub size: i64,
    /// Unix seconds with a fractional part.
    pub upload_time: f64,
    pub url: String,
    pub uploader_id: i64,
    pub uploader_username: Option<String>,
    pub uploader_role: Option<UserRole>,
}

/// Response to a successful upload. `url` is relative to the backend
/// host, not to the API base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    pub filename: String,
    pub original_name: String,
    pub size: i64,
}

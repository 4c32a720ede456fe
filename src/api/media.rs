//! Media upload and listing endpoints.
//!
//! Uploads are multipart POSTs under `/articles/`. The file bytes are
//! held in the request description so the pipeline can rebuild the form
//! if the upload has to be retried with a refreshed token.

use reqwest::Method;

use crate::models::{MediaItem, UploadedFile};

use super::client::{ApiClient, FilePart};
use super::ApiError;

/// Content type by file extension. The backend checks the multipart
/// content type for image uploads, so octet-stream is not good enough.
fn guess_content_type(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

impl ApiClient {
    /// Upload an image (5 MB limit server-side). The returned URL serves
    /// the file back through the API host.
    pub async fn upload_image(&self, file_name: &str, data: Vec<u8>) -> Result<UploadedFile, ApiError> {
        self.upload("/articles/upload-image", file_name, data).await
    }

    /// Upload a video (100 MB limit server-side).
    pub async fn upload_video(&self, file_name: &str, data: Vec<u8>) -> Result<UploadedFile, ApiError> {
        self.upload("/articles/upload-video", file_name, data).await
    }

    /// Upload a PDF document.
    pub async fn upload_document(
        &self,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<UploadedFile, ApiError> {
        self.upload("/articles/upload-pdf", file_name, data).await
    }

    async fn upload(
        &self,
        path: &str,
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<UploadedFile, ApiError> {
        self.request_json(self.request(Method::POST, path).file(FilePart {
            field: "file".to_string(),
            file_name: file_name.to_string(),
            content_type: guess_content_type(file_name).to_string(),
            data,
        }))
        .await
    }

    /// Uploaded files, newest first, optionally one uploader's only.
    pub async fn list_media(&self, uploader_id: Option<i64>) -> Result<Vec<MediaItem>, ApiError> {
        self.request_json(
            self.request(Method::GET, "/articles/media/list")
                .query_opt("uploader_id", uploader_id),
        )
        .await
    }

    /// Delete an uploaded file. Allowed for the uploader and admins.
    pub async fn delete_media(&self, media_id: i64) -> Result<(), ApiError> {
        self.request_unit(self.request(Method::DELETE, &format!("/articles/media/{media_id}")))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_the_extension() {
        assert_eq!(guess_content_type("photo.PNG"), "image/png");
        assert_eq!(guess_content_type("clip.mp4"), "video/mp4");
        assert_eq!(guess_content_type("paper.pdf"), "application/pdf");
        assert_eq!(guess_content_type("mystery"), "application/octet-stream");
        assert_eq!(guess_content_type("archive.tar.gz"), "application/octet-stream");
    }
}

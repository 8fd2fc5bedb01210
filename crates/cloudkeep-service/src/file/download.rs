//! File download and inline preview with access enforcement.

use std::sync::Arc;

use uuid::Uuid;

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_core::traits::content::{ByteStream, ContentStore};
use cloudkeep_database::repositories::file::FileRepository;
use cloudkeep_entity::file::File;

use crate::access::AccessResolver;

/// MIME types safe to render inline in a browser.
const PREVIEWABLE_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "application/pdf",
    "text/plain",
];

/// Result containing file metadata and a content stream.
pub struct DownloadResult {
    /// File metadata.
    pub file: File,
    /// File content stream.
    pub stream: ByteStream,
    /// MIME type for the Content-Type header.
    pub content_type: String,
    /// Suggested filename for Content-Disposition.
    pub filename: String,
}

impl std::fmt::Debug for DownloadResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadResult")
            .field("file", &self.file.id)
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Streams file content to readers the access resolver admits.
#[derive(Clone)]
pub struct DownloadService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Content store.
    content: Arc<dyn ContentStore>,
    /// Access resolver.
    resolver: Arc<AccessResolver>,
}

impl std::fmt::Debug for DownloadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadService").finish()
    }
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        content: Arc<dyn ContentStore>,
        resolver: Arc<AccessResolver>,
    ) -> Self {
        Self {
            file_repo,
            content,
            resolver,
        }
    }

    /// Downloads a file the actor can read.
    pub async fn download(&self, actor: Uuid, file_id: Uuid) -> AppResult<DownloadResult> {
        let file = self
            .file_repo
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        self.resolver.require_read_file(&file, actor).await?;

        let stream = self.content.read(&file.content_ref).await?;
        let content_type = file.mime_type.clone();

        Ok(DownloadResult {
            filename: file.filename.clone(),
            file,
            stream,
            content_type,
        })
    }

    /// Downloads a file for inline rendering.
    ///
    /// Restricted to a safelist of inline-renderable MIME types.
    pub async fn preview(&self, actor: Uuid, file_id: Uuid) -> AppResult<DownloadResult> {
        let result = self.download(actor, file_id).await?;
        if !PREVIEWABLE_MIME_TYPES.contains(&result.content_type.as_str()) {
            return Err(AppError::validation(format!(
                "Files of type '{}' cannot be previewed inline",
                result.content_type
            )));
        }
        Ok(result)
    }
}

//! File upload with quota enforcement and opaque content references.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use cloudkeep_core::config::storage::QuotaConfig;
use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_core::traits::content::ContentStore;
use cloudkeep_database::repositories::directory::DirectoryRepository;
use cloudkeep_database::repositories::file::FileRepository;
use cloudkeep_database::repositories::user::UserRepository;
use cloudkeep_entity::file::{CreateFile, File};

use crate::validate::validate_name;

/// Where an upload lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
    /// The uploader's root directory, created on first use.
    Root,
    /// A specific directory owned by the uploader.
    Directory(Uuid),
}

/// Parameters for a file upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target directory.
    pub target: UploadTarget,
    /// The user-visible file name.
    pub original_filename: String,
    /// MIME type; inferred from the filename when absent.
    pub mime_type: Option<String>,
    /// File content.
    pub data: Bytes,
}

/// Handles file uploads.
#[derive(Clone)]
pub struct UploadService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Directory repository.
    directory_repo: Arc<DirectoryRepository>,
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Content store.
    content: Arc<dyn ContentStore>,
    /// Host-supplied size policy.
    quota: QuotaConfig,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService").finish()
    }
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        directory_repo: Arc<DirectoryRepository>,
        user_repo: Arc<UserRepository>,
        content: Arc<dyn ContentStore>,
        quota: QuotaConfig,
    ) -> Self {
        Self {
            file_repo,
            directory_repo,
            user_repo,
            content,
            quota,
        }
    }

    /// Uploads a file into the actor's tree.
    ///
    /// Content is stored under a generated opaque reference; the
    /// user-visible filename never touches the content store.
    pub async fn upload(&self, actor: Uuid, req: UploadRequest) -> AppResult<File> {
        let filename = validate_name(&req.original_filename, "File")?;

        if let Some(limit) = self.quota.max_upload_size_bytes
            && req.data.len() as u64 > limit
        {
            return Err(AppError::quota_exceeded(format!(
                "File exceeds the maximum upload size of {limit} bytes"
            )));
        }

        let directory = match req.target {
            UploadTarget::Root => {
                self.user_repo
                    .find_by_id(actor)
                    .await?
                    .ok_or_else(|| AppError::not_found("User not found"))?;
                self.directory_repo.get_or_create_root(actor).await?
            }
            UploadTarget::Directory(directory_id) => self
                .directory_repo
                .find_by_id(directory_id)
                .await?
                .filter(|d| d.owner_id == actor)
                .ok_or_else(|| AppError::not_found("Target directory not found"))?,
        };

        let mime_type = req.mime_type.unwrap_or_else(|| {
            mime_guess::from_path(&filename)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

        let size_bytes = req.data.len() as i64;
        let content_ref = self.content.write(req.data).await?;

        let record = CreateFile {
            filename,
            content_ref: content_ref.clone(),
            mime_type,
            size_bytes,
            directory_id: directory.id,
            owner_id: actor,
        };

        let file = match self.file_repo.create(&record).await {
            Ok(file) => file,
            Err(e) => {
                // The row never landed; drop the blob rather than leaving
                // it for the maintenance sweep.
                if let Err(cleanup) = self.content.delete(&content_ref).await {
                    warn!(content_ref = %content_ref, error = %cleanup, "Failed to delete blob");
                }
                return Err(e);
            }
        };

        info!(
            user_id = %actor,
            file_id = %file.id,
            directory_id = %directory.id,
            size_bytes,
            "File uploaded"
        );

        Ok(file)
    }
}

//! File rename, move, and delete operations.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_core::traits::content::ContentStore;
use cloudkeep_database::repositories::directory::DirectoryRepository;
use cloudkeep_database::repositories::file::FileRepository;
use cloudkeep_entity::file::File;

use crate::access::AccessResolver;
use crate::validate::validate_name;

/// Per-file result of a bulk delete.
#[derive(Debug)]
pub struct BulkDeleteOutcome {
    /// The file this outcome refers to.
    pub file_id: Uuid,
    /// Success, or the failure for this file alone.
    pub result: Result<(), AppError>,
}

/// Manages file mutations.
#[derive(Clone)]
pub struct FileService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Directory repository.
    directory_repo: Arc<DirectoryRepository>,
    /// Access resolver.
    resolver: Arc<AccessResolver>,
    /// Content store.
    content: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for FileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileService").finish()
    }
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        directory_repo: Arc<DirectoryRepository>,
        resolver: Arc<AccessResolver>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            file_repo,
            directory_repo,
            resolver,
            content,
        }
    }

    /// Gets a file the actor can read.
    pub async fn get(&self, actor: Uuid, file_id: Uuid) -> AppResult<File> {
        let file = self
            .file_repo
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        self.resolver.require_read_file(&file, actor).await?;
        Ok(file)
    }

    /// Renames a file. Owner only.
    pub async fn rename(&self, actor: Uuid, file_id: Uuid, new_name: &str) -> AppResult<File> {
        let new_name = validate_name(new_name, "File")?;

        let file = self
            .file_repo
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        if file.owner_id != actor {
            return Err(AppError::forbidden("Only the owner can rename a file"));
        }

        let renamed = self.file_repo.rename(file_id, &new_name).await?;

        info!(user_id = %actor, file_id = %file_id, new_name = %new_name, "File renamed");

        Ok(renamed)
    }

    /// Moves a file into a different directory.
    ///
    /// The actor needs an effective grant on both the file and the
    /// destination, and the destination must belong to the file's owner.
    pub async fn move_file(
        &self,
        actor: Uuid,
        file_id: Uuid,
        new_directory_id: Uuid,
    ) -> AppResult<File> {
        let file = self
            .file_repo
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        let destination = self
            .directory_repo
            .find_by_id(new_directory_id)
            .await?
            .ok_or_else(|| AppError::not_found("Destination directory not found"))?;

        self.resolver.require_read_file(&file, actor).await?;
        self.resolver
            .require_read_directory(&destination, actor)
            .await?;

        if file.owner_id != destination.owner_id {
            return Err(AppError::forbidden(
                "A file cannot be moved into another user's tree",
            ));
        }

        let moved = self.file_repo.set_directory(file_id, new_directory_id).await?;

        info!(
            user_id = %actor,
            file_id = %file_id,
            new_directory_id = %new_directory_id,
            "File moved"
        );

        Ok(moved)
    }

    /// Deletes a file, its grants, and its blob. Owner only.
    pub async fn delete(&self, actor: Uuid, file_id: Uuid) -> AppResult<()> {
        let file = self
            .file_repo
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        if file.owner_id != actor {
            return Err(AppError::forbidden("Only the owner can delete a file"));
        }

        if let Some(content_ref) = self.file_repo.delete_with_grants(file_id).await?
            && let Err(e) = self.content.delete(&content_ref).await
        {
            warn!(content_ref = %content_ref, error = %e, "Failed to delete blob");
        }

        info!(user_id = %actor, file_id = %file_id, "File deleted");

        Ok(())
    }

    /// Deletes each file independently and reports per-file outcomes.
    ///
    /// One failing file never aborts the batch; the call itself succeeds
    /// once every ID has been evaluated.
    pub async fn bulk_delete(&self, actor: Uuid, file_ids: &[Uuid]) -> Vec<BulkDeleteOutcome> {
        let mut outcomes = Vec::with_capacity(file_ids.len());
        for &file_id in file_ids {
            outcomes.push(BulkDeleteOutcome {
                file_id,
                result: self.delete(actor, file_id).await,
            });
        }
        outcomes
    }
}

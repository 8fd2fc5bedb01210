//! Directory CRUD operations with access control enforcement.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_core::traits::content::ContentStore;
use cloudkeep_database::repositories::directory::DirectoryRepository;
use cloudkeep_database::repositories::user::UserRepository;
use cloudkeep_entity::directory::{CreateDirectory, Directory};

use crate::access::AccessResolver;
use crate::validate::validate_name;

/// Manages the per-owner directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    /// Directory repository.
    directory_repo: Arc<DirectoryRepository>,
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Access resolver.
    resolver: Arc<AccessResolver>,
    /// Content store for blob removal after cascades.
    content: Arc<dyn ContentStore>,
}

impl DirectoryService {
    /// Creates a new directory service.
    pub fn new(
        directory_repo: Arc<DirectoryRepository>,
        user_repo: Arc<UserRepository>,
        resolver: Arc<AccessResolver>,
        content: Arc<dyn ContentStore>,
    ) -> Self {
        Self {
            directory_repo,
            user_repo,
            resolver,
            content,
        }
    }

    /// Returns the owner's root directory, creating it if absent.
    ///
    /// Idempotent; concurrent first accesses resolve to a single root.
    pub async fn get_or_create_root(&self, owner_id: Uuid) -> AppResult<Directory> {
        self.user_repo
            .find_by_id(owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        self.directory_repo.get_or_create_root(owner_id).await
    }

    /// Gets a directory the actor can read.
    pub async fn get(&self, actor: Uuid, directory_id: Uuid) -> AppResult<Directory> {
        let directory = self
            .directory_repo
            .find_by_id(directory_id)
            .await?
            .ok_or_else(|| AppError::not_found("Directory not found"))?;
        self.resolver
            .require_read_directory(&directory, actor)
            .await?;
        Ok(directory)
    }

    /// Creates a new directory under a parent the actor owns.
    pub async fn create(&self, actor: Uuid, name: &str, parent_id: Uuid) -> AppResult<Directory> {
        let name = validate_name(name, "Directory")?;

        let parent = self
            .directory_repo
            .find_by_id(parent_id)
            .await?
            .filter(|p| p.owner_id == actor)
            .ok_or_else(|| AppError::not_found("Parent directory not found"))?;

        let directory = self
            .directory_repo
            .create(&CreateDirectory {
                name,
                parent_id: Some(parent.id),
                owner_id: actor,
            })
            .await?;

        info!(
            user_id = %actor,
            directory_id = %directory.id,
            parent_id = %parent.id,
            "Directory created"
        );

        Ok(directory)
    }

    /// Renames a directory. Owner only.
    pub async fn rename(
        &self,
        actor: Uuid,
        directory_id: Uuid,
        new_name: &str,
    ) -> AppResult<Directory> {
        let new_name = validate_name(new_name, "Directory")?;

        let directory = self
            .directory_repo
            .find_by_id(directory_id)
            .await?
            .ok_or_else(|| AppError::not_found("Directory not found"))?;
        if directory.owner_id != actor {
            return Err(AppError::forbidden("Only the owner can rename a directory"));
        }

        let renamed = self.directory_repo.rename(directory_id, &new_name).await?;

        info!(
            user_id = %actor,
            directory_id = %directory_id,
            new_name = %new_name,
            "Directory renamed"
        );

        Ok(renamed)
    }

    /// Moves a directory under a new parent.
    ///
    /// The actor needs an effective grant (ownership, direct, or inherited)
    /// on both the directory and the destination. The destination must
    /// belong to the same owner as the directory, so trees never span
    /// owners. Moving a directory into its own subtree fails with
    /// `CyclicMove`; the repository validates this in the same transaction
    /// as the reparent, so concurrent moves cannot commit a cycle.
    pub async fn move_directory(
        &self,
        actor: Uuid,
        directory_id: Uuid,
        new_parent_id: Uuid,
    ) -> AppResult<Directory> {
        let directory = self
            .directory_repo
            .find_by_id(directory_id)
            .await?
            .ok_or_else(|| AppError::not_found("Directory not found"))?;
        if directory.is_root() {
            return Err(AppError::validation("The root directory cannot be moved"));
        }

        let destination = self
            .directory_repo
            .find_by_id(new_parent_id)
            .await?
            .ok_or_else(|| AppError::not_found("Destination directory not found"))?;

        self.resolver
            .require_read_directory(&directory, actor)
            .await?;
        self.resolver
            .require_read_directory(&destination, actor)
            .await?;

        if directory.owner_id != destination.owner_id {
            return Err(AppError::forbidden(
                "A directory cannot be moved into another user's tree",
            ));
        }

        let moved = self
            .directory_repo
            .set_parent(directory_id, new_parent_id)
            .await?;

        info!(
            user_id = %actor,
            directory_id = %directory_id,
            new_parent_id = %new_parent_id,
            "Directory moved"
        );

        Ok(moved)
    }

    /// Deletes a directory and its whole subtree. Owner only.
    ///
    /// Descendant directories, contained files, and every grant referencing
    /// any of them are removed in one transaction; blobs are deleted after
    /// the commit (a failed blob delete leaves an orphan for the
    /// maintenance sweep).
    pub async fn delete(&self, actor: Uuid, directory_id: Uuid) -> AppResult<()> {
        let directory = self
            .directory_repo
            .find_by_id(directory_id)
            .await?
            .ok_or_else(|| AppError::not_found("Directory not found"))?;
        if directory.owner_id != actor {
            return Err(AppError::forbidden("Only the owner can delete a directory"));
        }
        if directory.is_root() {
            return Err(AppError::validation(
                "The root directory cannot be deleted while the account exists",
            ));
        }

        let content_refs = self.directory_repo.delete_subtree(directory_id).await?;
        let removed_files = content_refs.len();
        for content_ref in &content_refs {
            if let Err(e) = self.content.delete(content_ref).await {
                warn!(content_ref = %content_ref, error = %e, "Failed to delete blob");
            }
        }

        info!(
            user_id = %actor,
            directory_id = %directory_id,
            removed_files,
            "Directory deleted"
        );

        Ok(())
    }
}

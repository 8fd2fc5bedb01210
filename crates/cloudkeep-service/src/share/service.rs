//! Grant creation and revocation.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_core::types::pagination::{PageRequest, PageResponse};
use cloudkeep_database::repositories::directory::DirectoryRepository;
use cloudkeep_database::repositories::file::FileRepository;
use cloudkeep_database::repositories::share::ShareRepository;
use cloudkeep_database::repositories::user::UserRepository;
use cloudkeep_entity::share::{CreateShareGrant, ItemType, ShareGrant};

/// Manages share grants on files and directories.
#[derive(Debug, Clone)]
pub struct ShareService {
    /// Share repository.
    share_repo: Arc<ShareRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Directory repository.
    directory_repo: Arc<DirectoryRepository>,
    /// User repository.
    user_repo: Arc<UserRepository>,
}

impl ShareService {
    /// Creates a new share service.
    pub fn new(
        share_repo: Arc<ShareRepository>,
        file_repo: Arc<FileRepository>,
        directory_repo: Arc<DirectoryRepository>,
        user_repo: Arc<UserRepository>,
    ) -> Self {
        Self {
            share_repo,
            file_repo,
            directory_repo,
            user_repo,
        }
    }

    /// Shares a file with another user. Owner only.
    pub async fn share_file(
        &self,
        actor: Uuid,
        file_id: Uuid,
        grantee_id: Uuid,
    ) -> AppResult<ShareGrant> {
        let file = self
            .file_repo
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        if file.owner_id != actor {
            return Err(AppError::forbidden("Only the owner can share a file"));
        }

        self.create_grant(ItemType::File, file_id, actor, grantee_id)
            .await
    }

    /// Shares a directory and, through inheritance, its whole subtree.
    /// Owner only.
    pub async fn share_directory(
        &self,
        actor: Uuid,
        directory_id: Uuid,
        grantee_id: Uuid,
    ) -> AppResult<ShareGrant> {
        let directory = self
            .directory_repo
            .find_by_id(directory_id)
            .await?
            .ok_or_else(|| AppError::not_found("Directory not found"))?;
        if directory.owner_id != actor {
            return Err(AppError::forbidden("Only the owner can share a directory"));
        }

        self.create_grant(ItemType::Directory, directory_id, actor, grantee_id)
            .await
    }

    async fn create_grant(
        &self,
        item_type: ItemType,
        item_id: Uuid,
        granted_by: Uuid,
        granted_to: Uuid,
    ) -> AppResult<ShareGrant> {
        if granted_by == granted_to {
            return Err(AppError::validation("An item cannot be shared with its owner"));
        }
        self.user_repo
            .find_by_id(granted_to)
            .await?
            .ok_or_else(|| AppError::not_found("Grantee not found"))?;

        let grant = self
            .share_repo
            .create(&CreateShareGrant {
                item_type,
                item_id,
                granted_by,
                granted_to,
            })
            .await?;

        info!(
            item_type = %item_type,
            item_id = %item_id,
            granted_by = %granted_by,
            granted_to = %granted_to,
            "Grant created"
        );

        Ok(grant)
    }

    /// Revokes the grant for an item and grantee.
    ///
    /// Allowed for the user who created the grant and for the grantee
    /// declining the share.
    pub async fn unshare(
        &self,
        actor: Uuid,
        item_type: ItemType,
        item_id: Uuid,
        granted_to: Uuid,
    ) -> AppResult<()> {
        let grant = self
            .share_repo
            .find_grant(item_type, item_id, granted_to)
            .await?
            .ok_or_else(|| AppError::not_found("Grant not found"))?;

        if actor != grant.granted_by && actor != grant.granted_to {
            return Err(AppError::forbidden(
                "Only the granter or the grantee can revoke a grant",
            ));
        }

        self.share_repo.delete(item_type, item_id, granted_to).await?;

        info!(
            item_type = %item_type,
            item_id = %item_id,
            granted_to = %granted_to,
            revoked_by = %actor,
            "Grant revoked"
        );

        Ok(())
    }

    /// Lists the grants the actor has created.
    pub async fn shares_created(
        &self,
        actor: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<ShareGrant>> {
        self.share_repo.find_by_creator(actor, &page).await
    }

    /// Lists the grants the actor has received.
    pub async fn shares_received(
        &self,
        actor: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<ShareGrant>> {
        self.share_repo.find_received(actor, &page).await
    }
}

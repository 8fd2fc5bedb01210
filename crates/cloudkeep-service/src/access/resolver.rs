//! Access resolver for files and directories.
//!
//! Resolution order:
//! 1. Owner check — the item's owner always has access.
//! 2. Direct grant — a `ShareGrant` on the item itself.
//! 3. Inherited grant — a grant on any ancestor directory; directory
//!    shares cover all descendants but never siblings or parents.
//!
//! The walk runs from the item up to the root and stops at the nearest
//! covering grant. Every call re-queries the store: grants can be revoked
//! at any moment, and a stale positive would be a security defect, so no
//! result is ever cached.

use std::sync::Arc;

use uuid::Uuid;

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_database::repositories::directory::DirectoryRepository;
use cloudkeep_database::repositories::file::FileRepository;
use cloudkeep_database::repositories::share::ShareRepository;
use cloudkeep_entity::directory::Directory;
use cloudkeep_entity::file::File;
use cloudkeep_entity::share::{ItemType, ShareGrant};

/// How a user's access to an item was derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessVia {
    /// The user owns the item.
    Owner,
    /// A grant exists on the item itself.
    DirectGrant {
        /// The user who created the grant.
        granted_by: Uuid,
    },
    /// A grant exists on an ancestor directory.
    InheritedGrant {
        /// The nearest granted ancestor.
        ancestor_id: Uuid,
        /// The user who created the grant.
        granted_by: Uuid,
    },
}

/// Result of resolving a user's access to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AccessDecision {
    /// Whether access is granted.
    pub visible: bool,
    /// The source of the access, when granted.
    pub via: Option<AccessVia>,
}

impl AccessDecision {
    fn granted(via: AccessVia) -> Self {
        Self {
            visible: true,
            via: Some(via),
        }
    }

    fn denied() -> Self {
        Self {
            visible: false,
            via: None,
        }
    }

    /// The granter behind this decision, if access came through a grant.
    pub fn granted_by(&self) -> Option<Uuid> {
        match self.via {
            Some(AccessVia::DirectGrant { granted_by })
            | Some(AccessVia::InheritedGrant { granted_by, .. }) => Some(granted_by),
            _ => None,
        }
    }
}

/// Resolves whether a user may access a file or directory.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    /// Directory repository (ancestor chains).
    directory_repo: Arc<DirectoryRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Share grant repository.
    share_repo: Arc<ShareRepository>,
}

impl AccessResolver {
    /// Creates a new access resolver.
    pub fn new(
        directory_repo: Arc<DirectoryRepository>,
        file_repo: Arc<FileRepository>,
        share_repo: Arc<ShareRepository>,
    ) -> Self {
        Self {
            directory_repo,
            file_repo,
            share_repo,
        }
    }

    /// Resolves access to an item identified by type and ID.
    ///
    /// Fails with `NotFound` if the item does not exist.
    pub async fn resolve(
        &self,
        user_id: Uuid,
        item_type: ItemType,
        item_id: Uuid,
    ) -> AppResult<AccessDecision> {
        match item_type {
            ItemType::File => {
                let file = self
                    .file_repo
                    .find_by_id(item_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("File not found"))?;
                self.resolve_file(&file, user_id).await
            }
            ItemType::Directory => {
                let directory = self
                    .directory_repo
                    .find_by_id(item_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Directory not found"))?;
                self.resolve_directory(&directory, user_id).await
            }
        }
    }

    /// Resolves access to an already-loaded file.
    pub async fn resolve_file(&self, file: &File, user_id: Uuid) -> AppResult<AccessDecision> {
        if file.owner_id == user_id {
            return Ok(AccessDecision::granted(AccessVia::Owner));
        }

        if let Some(grant) = self
            .share_repo
            .find_grant(ItemType::File, file.id, user_id)
            .await?
        {
            return Ok(AccessDecision::granted(AccessVia::DirectGrant {
                granted_by: grant.granted_by,
            }));
        }

        let chain = self
            .directory_repo
            .find_ancestor_ids(file.directory_id)
            .await?;
        Ok(self.nearest_inherited(&chain, user_id, None).await?)
    }

    /// Resolves access to an already-loaded directory.
    pub async fn resolve_directory(
        &self,
        directory: &Directory,
        user_id: Uuid,
    ) -> AppResult<AccessDecision> {
        if directory.owner_id == user_id {
            return Ok(AccessDecision::granted(AccessVia::Owner));
        }

        // The chain starts with the directory itself, so a grant on it
        // resolves as direct rather than inherited.
        let chain = self.directory_repo.find_ancestor_ids(directory.id).await?;
        Ok(self
            .nearest_inherited(&chain, user_id, Some(directory.id))
            .await?)
    }

    /// Resolves access and fails with `Forbidden` when denied.
    pub async fn require_read_file(
        &self,
        file: &File,
        user_id: Uuid,
    ) -> AppResult<AccessDecision> {
        let decision = self.resolve_file(file, user_id).await?;
        if !decision.visible {
            return Err(AppError::forbidden("You do not have access to this file"));
        }
        Ok(decision)
    }

    /// Resolves access and fails with `Forbidden` when denied.
    pub async fn require_read_directory(
        &self,
        directory: &Directory,
        user_id: Uuid,
    ) -> AppResult<AccessDecision> {
        let decision = self.resolve_directory(directory, user_id).await?;
        if !decision.visible {
            return Err(AppError::forbidden(
                "You do not have access to this directory",
            ));
        }
        Ok(decision)
    }

    /// Scans an ancestor chain (nearest first) for the closest covering
    /// directory grant. When `self_id` matches the winning ancestor the
    /// grant is reported as direct.
    async fn nearest_inherited(
        &self,
        chain: &[Uuid],
        user_id: Uuid,
        self_id: Option<Uuid>,
    ) -> AppResult<AccessDecision> {
        let grants: Vec<ShareGrant> = self
            .share_repo
            .find_directory_grants_in(user_id, chain)
            .await?;
        if grants.is_empty() {
            return Ok(AccessDecision::denied());
        }

        for ancestor_id in chain {
            if let Some(grant) = grants.iter().find(|g| g.item_id == *ancestor_id) {
                let via = if self_id == Some(*ancestor_id) {
                    AccessVia::DirectGrant {
                        granted_by: grant.granted_by,
                    }
                } else {
                    AccessVia::InheritedGrant {
                        ancestor_id: *ancestor_id,
                        granted_by: grant.granted_by,
                    }
                };
                return Ok(AccessDecision::granted(via));
            }
        }

        Ok(AccessDecision::denied())
    }
}

//! Directory listings with sharing provenance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_database::repositories::directory::DirectoryRepository;
use cloudkeep_database::repositories::file::FileRepository;
use cloudkeep_database::repositories::share::ShareRepository;
use cloudkeep_database::repositories::user::UserRepository;
use cloudkeep_entity::directory::Directory;
use cloudkeep_entity::file::File;
use cloudkeep_entity::share::ItemType;

use crate::access::{AccessResolver, AccessVia};

/// Sharing provenance attached to every listed entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Provenance {
    /// The viewer sees this item through a grant rather than ownership.
    pub is_shared: bool,
    /// The viewer owns this item and has shared it with someone.
    pub is_shared_by_owner: bool,
    /// Email of the granter, when `is_shared`.
    pub shared_by: Option<String>,
}

/// A directory entry in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedDirectory {
    /// The directory.
    pub directory: Directory,
    /// Sharing provenance.
    pub provenance: Provenance,
}

/// A file entry in a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedFile {
    /// The file.
    pub file: File,
    /// Sharing provenance.
    pub provenance: Provenance,
}

/// The contents of one directory as seen by one viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryListing {
    /// The listed directory.
    pub directory_id: Uuid,
    /// Child directories.
    pub directories: Vec<ListedDirectory>,
    /// Contained files.
    pub files: Vec<ListedFile>,
}

/// Produces provenance-tagged directory listings.
#[derive(Debug, Clone)]
pub struct ListingService {
    /// Directory repository.
    directory_repo: Arc<DirectoryRepository>,
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Share grant repository.
    share_repo: Arc<ShareRepository>,
    /// User repository (granter emails).
    user_repo: Arc<UserRepository>,
    /// Access resolver.
    resolver: Arc<AccessResolver>,
}

impl ListingService {
    /// Creates a new listing service.
    pub fn new(
        directory_repo: Arc<DirectoryRepository>,
        file_repo: Arc<FileRepository>,
        share_repo: Arc<ShareRepository>,
        user_repo: Arc<UserRepository>,
        resolver: Arc<AccessResolver>,
    ) -> Self {
        Self {
            directory_repo,
            file_repo,
            share_repo,
            user_repo,
            resolver,
        }
    }

    /// Lists the contents of a directory the viewer can read.
    ///
    /// An owner sees ownership provenance (`is_shared_by_owner` marks items
    /// they have granted away); a grantee sees every child tagged with the
    /// covering grant's creator.
    pub async fn list(&self, viewer: Uuid, directory_id: Uuid) -> AppResult<DirectoryListing> {
        let directory = self
            .directory_repo
            .find_by_id(directory_id)
            .await?
            .ok_or_else(|| AppError::not_found("Directory not found"))?;
        let decision = self
            .resolver
            .require_read_directory(&directory, viewer)
            .await?;

        let children = self.directory_repo.find_children(directory_id).await?;
        let files = self.file_repo.find_by_directory(directory_id).await?;

        match decision.via {
            Some(AccessVia::Owner) => self.owner_listing(directory_id, children, files).await,
            _ => {
                let shared_by = match decision.granted_by() {
                    Some(granter) => self.email_of(granter).await?,
                    None => None,
                };
                let provenance = Provenance {
                    is_shared: true,
                    is_shared_by_owner: false,
                    shared_by,
                };
                Ok(DirectoryListing {
                    directory_id,
                    directories: children
                        .into_iter()
                        .map(|directory| ListedDirectory {
                            directory,
                            provenance: provenance.clone(),
                        })
                        .collect(),
                    files: files
                        .into_iter()
                        .map(|file| ListedFile {
                            file,
                            provenance: provenance.clone(),
                        })
                        .collect(),
                })
            }
        }
    }

    /// Lists the viewer's root, bootstrapping it if needed.
    ///
    /// Besides the root's own children, items shared with the viewer whose
    /// containing directory is not itself (transitively) shared appear as
    /// pseudo-children, so individually shared items always surface
    /// somewhere navigable.
    pub async fn list_root(&self, viewer: Uuid) -> AppResult<DirectoryListing> {
        self.user_repo
            .find_by_id(viewer)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        let root = self.directory_repo.get_or_create_root(viewer).await?;

        let children = self.directory_repo.find_children(root.id).await?;
        let files = self.file_repo.find_by_directory(root.id).await?;
        let mut listing = self.owner_listing(root.id, children, files).await?;

        let grants = self.share_repo.find_by_grantee(viewer).await?;
        let granted_dirs: HashSet<Uuid> = grants
            .iter()
            .filter(|g| g.item_type == ItemType::Directory)
            .map(|g| g.item_id)
            .collect();
        let mut emails: HashMap<Uuid, Option<String>> = HashMap::new();

        for grant in &grants {
            let shared_by = match emails.get(&grant.granted_by) {
                Some(cached) => cached.clone(),
                None => {
                    let email = self.email_of(grant.granted_by).await?;
                    emails.insert(grant.granted_by, email.clone());
                    email
                }
            };
            let provenance = Provenance {
                is_shared: true,
                is_shared_by_owner: false,
                shared_by,
            };

            match grant.item_type {
                ItemType::Directory => {
                    let Some(directory) = self.directory_repo.find_by_id(grant.item_id).await?
                    else {
                        continue;
                    };
                    if let Some(parent_id) = directory.parent_id
                        && self.covered_by(parent_id, &granted_dirs).await?
                    {
                        continue;
                    }
                    listing.directories.push(ListedDirectory {
                        directory,
                        provenance,
                    });
                }
                ItemType::File => {
                    let Some(file) = self.file_repo.find_by_id(grant.item_id).await? else {
                        continue;
                    };
                    if self.covered_by(file.directory_id, &granted_dirs).await? {
                        continue;
                    }
                    listing.files.push(ListedFile { file, provenance });
                }
            }
        }

        Ok(listing)
    }

    /// Whether a directory or any of its ancestors carries one of the
    /// given directory grants.
    async fn covered_by(
        &self,
        directory_id: Uuid,
        granted_dirs: &HashSet<Uuid>,
    ) -> AppResult<bool> {
        let chain = self.directory_repo.find_ancestor_ids(directory_id).await?;
        Ok(chain.iter().any(|id| granted_dirs.contains(id)))
    }

    async fn owner_listing(
        &self,
        directory_id: Uuid,
        children: Vec<Directory>,
        files: Vec<File>,
    ) -> AppResult<DirectoryListing> {
        let mut directories = Vec::with_capacity(children.len());
        for directory in children {
            let shared = self
                .share_repo
                .has_grants(ItemType::Directory, directory.id)
                .await?;
            directories.push(ListedDirectory {
                directory,
                provenance: Provenance {
                    is_shared_by_owner: shared,
                    ..Provenance::default()
                },
            });
        }

        let mut listed_files = Vec::with_capacity(files.len());
        for file in files {
            let shared = self.share_repo.has_grants(ItemType::File, file.id).await?;
            listed_files.push(ListedFile {
                file,
                provenance: Provenance {
                    is_shared_by_owner: shared,
                    ..Provenance::default()
                },
            });
        }

        Ok(DirectoryListing {
            directory_id,
            directories,
            files: listed_files,
        })
    }

    async fn email_of(&self, user_id: Uuid) -> AppResult<Option<String>> {
        Ok(self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map(|u| u.email))
    }
}

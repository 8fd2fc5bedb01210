//! User registration and account deletion.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_core::traits::content::ContentStore;
use cloudkeep_database::repositories::user::UserRepository;
use cloudkeep_entity::user::{CreateUser, User};

use crate::validate::validate_email;

/// Manages user accounts.
#[derive(Clone)]
pub struct UserService {
    /// User repository.
    user_repo: Arc<UserRepository>,
    /// Content store, for purging blobs on account deletion.
    content: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish()
    }
}

impl UserService {
    /// Creates a new user service.
    pub fn new(user_repo: Arc<UserRepository>, content: Arc<dyn ContentStore>) -> Self {
        Self { user_repo, content }
    }

    /// Registers a new user.
    pub async fn register(&self, email: &str, is_admin: bool) -> AppResult<User> {
        let email = validate_email(email)?;

        let user = self.user_repo.create(&CreateUser { email, is_admin }).await?;

        info!(user_id = %user.id, "User registered");

        Ok(user)
    }

    /// Finds a user by ID.
    pub async fn find(&self, user_id: Uuid) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Finds a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<User> {
        self.user_repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Deletes a user together with all directories, files, and grants,
    /// given or received.
    pub async fn delete(&self, user_id: Uuid) -> AppResult<()> {
        let content_refs = self.user_repo.delete_cascade(user_id).await?;
        let removed_files = content_refs.len();

        for content_ref in content_refs {
            if let Err(e) = self.content.delete(&content_ref).await {
                warn!(content_ref = %content_ref, error = %e, "Failed to delete blob");
            }
        }

        info!(user_id = %user_id, removed_files, "User deleted");

        Ok(())
    }
}

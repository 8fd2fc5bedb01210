//! Filename search scoped to a user's visible files.

use std::sync::Arc;

use uuid::Uuid;

use cloudkeep_core::error::AppError;
use cloudkeep_core::result::AppResult;
use cloudkeep_core::types::pagination::{PageRequest, PageResponse};
use cloudkeep_database::repositories::file::FileRepository;
use cloudkeep_entity::file::File;

/// Case-insensitive substring search over filenames.
#[derive(Debug, Clone)]
pub struct SearchService {
    /// File repository.
    file_repo: Arc<FileRepository>,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(file_repo: Arc<FileRepository>) -> Self {
        Self { file_repo }
    }

    /// Searches the files the actor owns or can see through grants.
    pub async fn search(
        &self,
        actor: Uuid,
        query: &str,
        page: PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::validation("Search query cannot be empty"));
        }

        self.file_repo.search_visible(actor, query, &page).await
    }
}

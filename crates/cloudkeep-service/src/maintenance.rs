//! Orphan repair between the database and the content store.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use cloudkeep_core::result::AppResult;
use cloudkeep_core::traits::content::ContentStore;
use cloudkeep_database::repositories::file::FileRepository;

/// What an orphan sweep found and fixed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OrphanReport {
    /// Blobs removed because no file row referenced them.
    pub blobs_removed: usize,
    /// File rows removed because their blob was missing.
    pub rows_removed: usize,
    /// Entries that could not be repaired.
    pub errors: usize,
}

/// Reconciles file rows against stored blobs.
#[derive(Clone)]
pub struct MaintenanceService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Content store.
    content: Arc<dyn ContentStore>,
}

impl std::fmt::Debug for MaintenanceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceService").finish()
    }
}

impl MaintenanceService {
    /// Creates a new maintenance service.
    pub fn new(file_repo: Arc<FileRepository>, content: Arc<dyn ContentStore>) -> Self {
        Self { file_repo, content }
    }

    /// Removes unreferenced blobs and file rows whose blob is gone.
    ///
    /// A failure on one entry is counted and the sweep continues, so a
    /// single bad blob never blocks the rest of the repair.
    pub async fn clean_orphans(&self) -> AppResult<OrphanReport> {
        let mut report = OrphanReport::default();

        let rows = self.file_repo.list_content_refs().await?;
        let referenced: HashSet<&str> = rows.iter().map(|(_, r)| r.as_str()).collect();

        for content_ref in self.content.list_refs().await? {
            if referenced.contains(content_ref.as_str()) {
                continue;
            }
            match self.content.delete(&content_ref).await {
                Ok(()) => report.blobs_removed += 1,
                Err(e) => {
                    warn!(content_ref = %content_ref, error = %e, "Failed to remove orphan blob");
                    report.errors += 1;
                }
            }
        }

        for (file_id, content_ref) in &rows {
            match self.content.exists(content_ref).await {
                Ok(true) => {}
                Ok(false) => match self.file_repo.delete_with_grants(*file_id).await {
                    Ok(_) => report.rows_removed += 1,
                    Err(e) => {
                        warn!(file_id = %file_id, error = %e, "Failed to remove orphan row");
                        report.errors += 1;
                    }
                },
                Err(e) => {
                    warn!(content_ref = %content_ref, error = %e, "Failed to check blob");
                    report.errors += 1;
                }
            }
        }

        info!(
            blobs_removed = report.blobs_removed,
            rows_removed = report.rows_removed,
            errors = report.errors,
            "Orphan sweep finished"
        );

        Ok(report)
    }
}

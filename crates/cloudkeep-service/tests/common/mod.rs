//! Shared test fixture wiring every service over an in-memory database
//! and a temporary content store.

use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;
use uuid::Uuid;

use cloudkeep_core::config::storage::QuotaConfig;
use cloudkeep_database::DatabasePool;
use cloudkeep_database::repositories::directory::DirectoryRepository;
use cloudkeep_database::repositories::file::FileRepository;
use cloudkeep_database::repositories::share::ShareRepository;
use cloudkeep_database::repositories::user::UserRepository;
use cloudkeep_entity::directory::Directory;
use cloudkeep_entity::file::File;
use cloudkeep_entity::user::User;
use cloudkeep_service::access::AccessResolver;
use cloudkeep_service::directory::{DirectoryService, ListingService};
use cloudkeep_service::file::{
    DownloadService, FileService, SearchService, UploadRequest, UploadService, UploadTarget,
};
use cloudkeep_service::maintenance::MaintenanceService;
use cloudkeep_service::share::ShareService;
use cloudkeep_service::user::UserService;
use cloudkeep_storage::LocalContentStore;

/// Fully wired application context backed by throwaway state.
pub struct TestApp {
    pub db: DatabasePool,
    pub content: Arc<LocalContentStore>,
    pub directories: DirectoryService,
    pub listings: ListingService,
    pub uploads: UploadService,
    pub downloads: DownloadService,
    pub files: FileService,
    pub search: SearchService,
    pub shares: ShareService,
    pub users: UserService,
    pub maintenance: MaintenanceService,
    pub resolver: Arc<AccessResolver>,
    _content_dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_quota(QuotaConfig {
            max_upload_size_bytes: None,
        })
        .await
    }

    pub async fn with_quota(quota: QuotaConfig) -> Self {
        let db = DatabasePool::connect_in_memory()
            .await
            .expect("Failed to open in-memory database");
        cloudkeep_database::migration::run_migrations(db.pool())
            .await
            .expect("Failed to run migrations");

        let content_dir = TempDir::new().expect("Failed to create temp content dir");
        let content = Arc::new(
            LocalContentStore::new(content_dir.path().to_str().unwrap())
                .await
                .expect("Failed to init content store"),
        );

        let user_repo = Arc::new(UserRepository::new(db.pool().clone()));
        let directory_repo = Arc::new(DirectoryRepository::new(db.pool().clone()));
        let file_repo = Arc::new(FileRepository::new(db.pool().clone()));
        let share_repo = Arc::new(ShareRepository::new(db.pool().clone()));

        let resolver = Arc::new(AccessResolver::new(
            directory_repo.clone(),
            file_repo.clone(),
            share_repo.clone(),
        ));

        let store: Arc<dyn cloudkeep_core::traits::content::ContentStore> = content.clone();

        Self {
            directories: DirectoryService::new(
                directory_repo.clone(),
                user_repo.clone(),
                resolver.clone(),
                store.clone(),
            ),
            listings: ListingService::new(
                directory_repo.clone(),
                file_repo.clone(),
                share_repo.clone(),
                user_repo.clone(),
                resolver.clone(),
            ),
            uploads: UploadService::new(
                file_repo.clone(),
                directory_repo.clone(),
                user_repo.clone(),
                store.clone(),
                quota,
            ),
            downloads: DownloadService::new(file_repo.clone(), store.clone(), resolver.clone()),
            files: FileService::new(
                file_repo.clone(),
                directory_repo.clone(),
                resolver.clone(),
                store.clone(),
            ),
            search: SearchService::new(file_repo.clone()),
            shares: ShareService::new(
                share_repo.clone(),
                file_repo.clone(),
                directory_repo.clone(),
                user_repo.clone(),
            ),
            users: UserService::new(user_repo.clone(), store.clone()),
            maintenance: MaintenanceService::new(file_repo, store),
            resolver,
            db,
            content,
            _content_dir: content_dir,
        }
    }

    /// Registers a user with a unique email.
    pub async fn create_user(&self, tag: &str) -> User {
        self.users
            .register(&format!("{tag}@example.com"), false)
            .await
            .expect("Failed to register user")
    }

    /// Creates a directory under the owner's root.
    pub async fn create_dir(&self, owner: &User, name: &str) -> Directory {
        let root = self
            .directories
            .get_or_create_root(owner.id)
            .await
            .expect("Failed to bootstrap root");
        self.directories
            .create(owner.id, name, root.id)
            .await
            .expect("Failed to create directory")
    }

    /// Uploads a small text file into a directory.
    pub async fn upload_text(&self, owner: &User, directory_id: Uuid, filename: &str) -> File {
        self.uploads
            .upload(
                owner.id,
                UploadRequest {
                    target: UploadTarget::Directory(directory_id),
                    original_filename: filename.to_string(),
                    mime_type: None,
                    data: Bytes::from_static(b"test content"),
                },
            )
            .await
            .expect("Failed to upload file")
    }
}

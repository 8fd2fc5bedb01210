//! File management: upload, download/preview, rename/move/delete, search.

pub mod download;
pub mod search;
pub mod service;
pub mod upload;

pub use download::{DownloadResult, DownloadService};
pub use search::SearchService;
pub use service::{BulkDeleteOutcome, FileService};
pub use upload::{UploadRequest, UploadService, UploadTarget};

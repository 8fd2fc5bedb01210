//! # cloudkeep-service
//!
//! Business logic services for CloudKeep. Each service is invoked by an
//! external host with an explicit acting user ID; no ambient identity
//! state exists anywhere in the core. Services consult the
//! [`access::AccessResolver`] before mutating the entity store.

pub mod access;
pub mod directory;
pub mod file;
pub mod maintenance;
pub mod share;
pub mod user;

mod validate;

pub use access::{AccessDecision, AccessResolver, AccessVia};
pub use directory::{DirectoryService, ListingService};
pub use file::{DownloadService, FileService, SearchService, UploadService};
pub use maintenance::MaintenanceService;
pub use share::ShareService;
pub use user::UserService;

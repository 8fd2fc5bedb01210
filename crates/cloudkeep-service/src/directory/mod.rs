//! Directory tree management and listing.

pub mod listing;
pub mod service;

pub use listing::{DirectoryListing, ListedDirectory, ListedFile, ListingService, Provenance};
pub use service::DirectoryService;

//! # cloudkeep-storage
//!
//! File content storage for CloudKeep. Blobs are addressed by opaque
//! content references generated at write time; the [`ContentStore`] trait
//! lives in `cloudkeep-core` and is implemented here.
//!
//! [`ContentStore`]: cloudkeep_core::traits::content::ContentStore

pub mod local;

pub use local::LocalContentStore;

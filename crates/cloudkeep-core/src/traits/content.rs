//! Content store trait for file blob storage backends.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::AppResult;

/// A byte stream type used for reading stored file content.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Trait for file content storage backends.
///
/// Content is addressed by an opaque *content reference* generated at write
/// time. The reference is distinct from the user-visible filename, so stored
/// blobs can never collide and a hostile filename can never traverse out of
/// the content root. The trait is defined here in `cloudkeep-core` and
/// implemented in `cloudkeep-storage`.
#[async_trait]
pub trait ContentStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the store type name (e.g., "local").
    fn store_type(&self) -> &str;

    /// Check whether the store is healthy and reachable.
    async fn health_check(&self) -> AppResult<bool>;

    /// Write bytes as a new blob and return its generated content reference.
    async fn write(&self, data: Bytes) -> AppResult<String>;

    /// Read a blob and return its byte stream.
    async fn read(&self, content_ref: &str) -> AppResult<ByteStream>;

    /// Read a blob into memory as a complete byte buffer.
    async fn read_bytes(&self, content_ref: &str) -> AppResult<Bytes>;

    /// Delete a blob. Deleting a missing blob is not an error.
    async fn delete(&self, content_ref: &str) -> AppResult<()>;

    /// Check whether a blob exists.
    async fn exists(&self, content_ref: &str) -> AppResult<bool>;

    /// List every content reference currently held by the store.
    ///
    /// Used by the orphan maintenance sweep; not expected to be cheap.
    async fn list_refs(&self) -> AppResult<Vec<String>>;
}

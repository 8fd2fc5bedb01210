//! Local filesystem content store.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use cloudkeep_core::error::{AppError, ErrorKind};
use cloudkeep_core::result::AppResult;
use cloudkeep_core::traits::content::{ByteStream, ContentStore};

/// Local filesystem content store.
///
/// Blobs are laid out as `<root>/<ref[..2]>/<ref[2..]>` where `ref` is a
/// 32-character lowercase hex string generated at write time. Because
/// references are validated before path resolution, a stored blob path can
/// never be influenced by user input.
#[derive(Debug, Clone)]
pub struct LocalContentStore {
    /// Root directory for all stored blobs.
    root: PathBuf,
}

impl LocalContentStore {
    /// Create a new local content store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create content root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve a validated content reference to an absolute blob path.
    fn resolve(&self, content_ref: &str) -> AppResult<PathBuf> {
        if !is_valid_ref(content_ref) {
            return Err(AppError::storage(format!(
                "Malformed content reference: {content_ref}"
            )));
        }
        Ok(self.root.join(&content_ref[..2]).join(&content_ref[2..]))
    }
}

/// A content reference is exactly 32 lowercase hex characters.
fn is_valid_ref(content_ref: &str) -> bool {
    content_ref.len() == 32
        && content_ref
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}

#[async_trait]
impl ContentStore for LocalContentStore {
    fn store_type(&self) -> &str {
        "local"
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn write(&self, data: Bytes) -> AppResult<String> {
        let content_ref = Uuid::new_v4().simple().to_string();
        let path = self.resolve(&content_ref)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to create shard directory: {}", parent.display()),
                    e,
                )
            })?;
        }

        let mut file = fs::File::create(&path).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to create blob", e)
        })?;
        file.write_all(&data).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to write blob", e)
        })?;
        file.flush().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to flush blob", e)
        })?;

        debug!(content_ref = %content_ref, size = data.len(), "Blob written");
        Ok(content_ref)
    }

    async fn read(&self, content_ref: &str) -> AppResult<ByteStream> {
        let path = self.resolve(content_ref)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {content_ref}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open blob: {content_ref}"),
                    e,
                )
            }
        })?;

        let stream = ReaderStream::new(file);
        Ok(Box::pin(stream.map(|r| r.map(|b| b.into()))))
    }

    async fn read_bytes(&self, content_ref: &str) -> AppResult<Bytes> {
        let path = self.resolve(content_ref)?;
        let data = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {content_ref}"))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read blob: {content_ref}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, content_ref: &str) -> AppResult<()> {
        let path = self.resolve(content_ref)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete blob: {content_ref}"),
                e,
            )),
        }
    }

    async fn exists(&self, content_ref: &str) -> AppResult<bool> {
        let path = self.resolve(content_ref)?;
        Ok(fs::try_exists(&path).await.unwrap_or(false))
    }

    async fn list_refs(&self) -> AppResult<Vec<String>> {
        let mut refs = Vec::new();
        let mut shards = fs::read_dir(&self.root).await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read content root", e)
        })?;

        while let Some(shard) = shards.next_entry().await.map_err(|e| {
            AppError::with_source(ErrorKind::Storage, "Failed to read content root", e)
        })? {
            if !shard.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let prefix = shard.file_name().to_string_lossy().into_owned();

            let mut blobs = fs::read_dir(shard.path()).await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read shard", e)
            })?;
            while let Some(blob) = blobs.next_entry().await.map_err(|e| {
                AppError::with_source(ErrorKind::Storage, "Failed to read shard", e)
            })? {
                let name = blob.file_name().to_string_lossy().into_owned();
                let candidate = format!("{prefix}{name}");
                if is_valid_ref(&candidate) {
                    refs.push(candidate);
                }
            }
        }

        Ok(refs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, LocalContentStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalContentStore::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    #[test]
    fn test_ref_validation() {
        assert!(is_valid_ref("0123456789abcdef0123456789abcdef"));
        assert!(!is_valid_ref("../../../../etc/passwd"));
        assert!(!is_valid_ref("0123456789ABCDEF0123456789ABCDEF"));
        assert!(!is_valid_ref("short"));
    }

    #[tokio::test]
    async fn test_write_then_read_round_trip() {
        let (_dir, store) = store().await;
        let content_ref = store.write(Bytes::from_static(b"hello")).await.unwrap();
        let data = store.read_bytes(&content_ref).await.unwrap();
        assert_eq!(&data[..], b"hello");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store) = store().await;
        let content_ref = store.write(Bytes::from_static(b"x")).await.unwrap();
        store.delete(&content_ref).await.unwrap();
        store.delete(&content_ref).await.unwrap();
        assert!(!store.exists(&content_ref).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_refs_sees_written_blobs() {
        let (_dir, store) = store().await;
        let a = store.write(Bytes::from_static(b"a")).await.unwrap();
        let b = store.write(Bytes::from_static(b"b")).await.unwrap();
        let mut refs = store.list_refs().await.unwrap();
        refs.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(refs, expected);
    }
}

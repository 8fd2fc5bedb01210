//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A file stored in CloudKeep.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The user-visible file name (including extension).
    pub filename: String,
    /// Opaque locator for the stored content, distinct from `filename`.
    pub content_ref: String,
    /// MIME type of the file.
    pub mime_type: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// The directory containing this file.
    pub directory_id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The user-visible file name.
    pub filename: String,
    /// Opaque content locator.
    pub content_ref: String,
    /// MIME type.
    pub mime_type: String,
    /// File size in bytes.
    pub size_bytes: i64,
    /// The directory to place the file in.
    pub directory_id: Uuid,
    /// The file owner.
    pub owner_id: Uuid,
}

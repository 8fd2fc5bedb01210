//! Directory entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A directory in a user's tree.
///
/// Every user has exactly one directory with `parent_id = NULL` (the root),
/// created lazily on first access. Non-root directories always have a parent
/// belonging to the same owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Directory {
    /// Unique directory identifier.
    pub id: Uuid,
    /// Directory name.
    pub name: String,
    /// Parent directory ID (null for the owner's root).
    pub parent_id: Option<Uuid>,
    /// The directory owner.
    pub owner_id: Uuid,
    /// When the directory was created.
    pub created_at: DateTime<Utc>,
}

impl Directory {
    /// Check if this is a root directory (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDirectory {
    /// Directory name.
    pub name: String,
    /// Parent directory (None for root).
    pub parent_id: Option<Uuid>,
    /// The directory owner.
    pub owner_id: Uuid,
}

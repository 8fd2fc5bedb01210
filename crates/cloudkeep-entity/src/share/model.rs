//! Share grant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The kind of item a grant refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    /// A file.
    File,
    /// A directory.
    Directory,
}

impl std::fmt::Display for ItemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// A grant allowing `granted_to` to view an item owned by `granted_by`.
///
/// At most one grant exists per `(item_type, item_id, granted_to)` tuple.
/// A directory grant does not materialize rows for contained items; the
/// access resolver treats it as covering all descendants.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShareGrant {
    /// Unique grant identifier.
    pub id: Uuid,
    /// Kind of the shared item.
    pub item_type: ItemType,
    /// ID of the shared item.
    pub item_id: Uuid,
    /// The user who created the grant.
    pub granted_by: Uuid,
    /// The user the item is shared with.
    pub granted_to: Uuid,
    /// When the grant was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new share grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShareGrant {
    /// Kind of the shared item.
    pub item_type: ItemType,
    /// ID of the shared item.
    pub item_id: Uuid,
    /// The user creating the grant.
    pub granted_by: Uuid,
    /// The user the item is shared with.
    pub granted_to: Uuid,
}

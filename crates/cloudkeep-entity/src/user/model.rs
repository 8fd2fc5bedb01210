//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An account that owns directories and files.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: Uuid,
    /// Unique email address.
    pub email: String,
    /// Whether the user has administrative privileges in the host.
    pub is_admin: bool,
    /// Whether the user is banned. Enforcement is a host concern.
    pub is_banned: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Unique email address.
    pub email: String,
    /// Whether the user is an administrator.
    pub is_admin: bool,
}

//! Content store and quota configuration.

use serde::{Deserialize, Serialize};

/// Top-level storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for stored file content.
    #[serde(default = "default_content_root")]
    pub content_root: String,
    /// Upload quota policy supplied by the host.
    #[serde(default)]
    pub quota: QuotaConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            quota: QuotaConfig::default(),
        }
    }
}

/// Size policy for uploads. The limit is owned by the hosting
/// environment; the core only enforces the comparison.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Maximum upload size in bytes. `None` means unlimited.
    #[serde(default)]
    pub max_upload_size_bytes: Option<u64>,
}

fn default_content_root() -> String {
    "./data/content".to_string()
}

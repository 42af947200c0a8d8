//! Database configuration
//!
//! The store is reached through a SurrealDB connection string. When no
//! string is given, an embedded RocksDB database is opened at `path`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Database configuration
///
/// Connection type is inferred:
/// - If `url` is set → connect with that connection string
///   (`mem://`, `rocksdb://...`, `ws://...`, `wss://...`, `http(s)://...`)
/// - If `path` is set (no `url`) → embedded RocksDB
/// - If neither → use default embedded path
/// - If both → error (ambiguous)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path for embedded RocksDB database
    pub path: Option<PathBuf>,

    /// SurrealDB connection string
    pub url: Option<String>,

    /// Namespace (defaults to "taskboard")
    pub namespace: Option<String>,

    /// Username for remote connection
    pub username: Option<String>,

    /// Password for remote connection
    pub password: Option<String>,
}

impl DatabaseConfig {
    /// Create config for embedded database at the given path
    pub fn embedded(path: PathBuf) -> Self {
        Self {
            path: Some(path),
            ..Default::default()
        }
    }

    /// Create config for remote database
    pub fn remote(url: String, username: String, password: String) -> Self {
        Self {
            url: Some(url),
            username: Some(username),
            password: Some(password),
            ..Default::default()
        }
    }

    /// Create config for a throwaway in-memory database
    pub fn in_memory() -> Self {
        Self {
            url: Some("mem://".to_string()),
            ..Default::default()
        }
    }

    /// Check if this config points at a database server that needs credentials
    pub fn is_remote(&self) -> bool {
        self.url.as_deref().is_some_and(|url| {
            ["ws://", "wss://", "http://", "https://"]
                .iter()
                .any(|scheme| url.starts_with(scheme))
        })
    }

    /// Get the namespace (defaults to "taskboard")
    pub fn namespace(&self) -> &str {
        self.namespace.as_deref().unwrap_or("taskboard")
    }
}

//! Opening the task database
//!
//! The engine is chosen from the connection string at runtime:
//! `mem://` for throwaway stores, `rocksdb://<dir>` for the on-disk default,
//! and `ws://`/`wss://`/`http://`/`https://` for a SurrealDB server.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use surrealdb::Surreal;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::migrations;

/// Open handle on one SurrealDB database, schema migrated
#[derive(Clone)]
pub struct Database {
    client: Surreal<Any>,
    database_name: String,
}

impl Database {
    /// Open `database_name` and bring its schema up to date.
    ///
    /// `config.url` is passed to the engine as is; server schemes also sign
    /// in as root with the configured credentials. Without a URL the store
    /// lives in RocksDB at `config.path`, else at `default_path`. Setting both
    /// `url` and `path` is an error.
    pub async fn connect(
        config: &DatabaseConfig,
        database_name: &str,
        default_path: Option<PathBuf>,
    ) -> Result<Self> {
        let client = open(config, default_path).await?;

        let namespace = config.namespace();
        client
            .use_ns(namespace)
            .use_db(database_name)
            .await
            .context("Failed to select namespace/database")?;

        info!("Connected to database: {}/{}", namespace, database_name);

        let db = Self {
            client,
            database_name: database_name.to_string(),
        };

        db.run_migrations().await?;

        Ok(db)
    }

    /// Get a reference to the SurrealDB client
    pub fn client(&self) -> &Surreal<Any> {
        &self.client
    }

    /// Get the database name
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Run pending migrations for this database
    async fn run_migrations(&self) -> Result<()> {
        migrations::run_migrations(&self.client, &self.database_name).await
    }
}

/// Connection string for `config`, plus whether it needs a root sign-in
fn endpoint(config: &DatabaseConfig, default_path: Option<PathBuf>) -> Result<(String, bool)> {
    match (&config.url, &config.path) {
        (Some(_), Some(_)) => {
            bail!("Database config has both 'url' and 'path' set - this is ambiguous")
        }
        (Some(url), None) => Ok((url.clone(), config.is_remote())),
        (None, path) => {
            let path = path
                .clone()
                .or(default_path)
                .context("No database path specified and no default provided")?;
            Ok((format!("rocksdb://{}", path.display()), false))
        }
    }
}

async fn open(config: &DatabaseConfig, default_path: Option<PathBuf>) -> Result<Surreal<Any>> {
    let (address, sign_in) = endpoint(config, default_path)?;
    info!("Opening task database: {}", address);

    let client = surrealdb::engine::any::connect(address.as_str())
        .await
        .with_context(|| format!("Failed to open database at {}", address))?;

    if sign_in {
        let username = config
            .username
            .as_deref()
            .context("Remote database requires 'username'")?;
        let password = config
            .password
            .as_deref()
            .context("Remote database requires 'password'")?;
        client
            .signin(Root { username, password })
            .await
            .context("Failed to authenticate with remote database")?;
    }

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let db = Database::connect(&DatabaseConfig::in_memory(), "tasks", None)
            .await
            .unwrap();
        assert_eq!(db.database_name(), "tasks");
    }

    #[tokio::test]
    async fn test_connect_rejects_ambiguous_config() {
        let config = DatabaseConfig {
            url: Some("mem://".to_string()),
            path: Some(PathBuf::from("/tmp/taskboard-db")),
            ..Default::default()
        };
        let err = Database::connect(&config, "tasks", None).await.err().unwrap();
        assert!(err.to_string().contains("ambiguous"));
    }

    #[test]
    fn test_endpoint_selection() {
        let fallback = Some(PathBuf::from("/data/tasks"));

        let (address, sign_in) = endpoint(&DatabaseConfig::in_memory(), None).unwrap();
        assert_eq!(address, "mem://");
        assert!(!sign_in);

        let (address, sign_in) = endpoint(&DatabaseConfig::default(), fallback.clone()).unwrap();
        assert_eq!(address, "rocksdb:///data/tasks");
        assert!(!sign_in);

        let remote = DatabaseConfig {
            url: Some("wss://db.example.com".to_string()),
            ..Default::default()
        };
        assert!(endpoint(&remote, fallback).unwrap().1);

        assert!(endpoint(&DatabaseConfig::default(), None).is_err());
    }

    #[tokio::test]
    async fn test_connect_unreachable_remote_fails() {
        let config = DatabaseConfig {
            url: Some("ws://127.0.0.1:1".to_string()),
            ..Default::default()
        };
        assert!(Database::connect(&config, "tasks", None).await.is_err());
    }
}

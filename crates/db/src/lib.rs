//! Database connection and migration management for Taskboard
//!
//! Provides a unified interface for connecting to SurrealDB through a
//! connection string: in-memory, embedded RocksDB or a remote server.

mod config;
mod connection;
mod migrations;

pub use config::DatabaseConfig;
pub use connection::Database;

//! Error types for the task store

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field was missing or empty
    #[error("{0}")]
    Validation(String),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    /// The database answered, but not with what the operation expects
    #[error("Store error: {0}")]
    Unexpected(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

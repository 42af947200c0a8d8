//! Task store for Taskboard
//!
//! CRUD and predicate queries over task records held in SurrealDB.

pub mod error;
pub mod store;
pub mod task;

pub use error::{Result, StoreError};
pub use store::Store;
pub use task::{normalize_title, Task, TaskFilter, TaskPatch};

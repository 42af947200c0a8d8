//! Database store for tasks
//!
//! Every operation maps to one or two SurrealDB calls against the `task`
//! table. Per-record atomicity is whatever the database provides.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use db::{Database, DatabaseConfig};
use surrealdb::sql::Datetime;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::task::{Task, TaskFilter, TaskPatch, TABLE};

/// Name of the SurrealDB database holding the task table
pub const DATABASE_NAME: &str = "tasks";

/// Database store for tasks
#[derive(Clone)]
pub struct Store {
    db: Database,
}

impl Store {
    /// Wrap an already connected database
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Connect using the given config and run migrations
    pub async fn connect(config: &DatabaseConfig, default_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let db = Database::connect(config, DATABASE_NAME, default_path).await?;
        Ok(Self::new(db))
    }

    /// Insert a new task
    ///
    /// The title is validated before the database is contacted.
    pub async fn insert(&self, title: &str, due_date: Option<DateTime<Utc>>) -> Result<Task> {
        let task = Task::new(title, due_date)?;

        let created: Option<Task> = self.db.client().create(TABLE).content(task).await?;
        let created = created
            .ok_or_else(|| StoreError::Unexpected("Task creation returned no result".to_string()))?;

        debug!("Created task {}", created.id_str().unwrap_or_default());
        Ok(created)
    }

    /// Get a task by id
    pub async fn get(&self, id: &str) -> Result<Task> {
        let task: Option<Task> = self.db.client().select((TABLE, id)).await?;
        task.ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Partially update a task
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let mut task = self.get(id).await?;
        task.apply(patch)?;
        self.replace(id, task).await
    }

    /// Flip the completion flag of a task
    pub async fn toggle(&self, id: &str) -> Result<Task> {
        let mut task = self.get(id).await?;
        task.toggle();
        self.replace(id, task).await
    }

    /// Delete a task
    pub async fn delete(&self, id: &str) -> Result<()> {
        let deleted: Option<Task> = self.db.client().delete((TABLE, id)).await?;
        match deleted {
            Some(_) => {
                debug!("Deleted task {}", id);
                Ok(())
            }
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    /// List tasks matching the filter, newest first
    pub async fn list(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let mut query = String::from("SELECT * FROM task");
        if filter.completed().is_some() {
            query.push_str(" WHERE completed = $completed");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut stmt = self.db.client().query(query);
        if let Some(completed) = filter.completed() {
            stmt = stmt.bind(("completed", completed));
        }

        let mut response = stmt.await?;
        let tasks: Vec<Task> = response.take(0)?;

        debug!("Listed {} task(s) with filter '{}'", tasks.len(), filter.as_str());
        Ok(tasks)
    }

    /// Open tasks due strictly after `now`, soonest first
    pub async fn upcoming(&self, now: DateTime<Utc>) -> Result<Vec<Task>> {
        let mut response = self
            .db
            .client()
            .query(
                "SELECT * FROM task \
                 WHERE completed = false AND due_date != NONE AND due_date > $now \
                 ORDER BY due_date ASC",
            )
            .bind(("now", Datetime::from(now)))
            .await?;

        let tasks: Vec<Task> = response.take(0)?;
        Ok(tasks)
    }

    /// Write back a full task record
    async fn replace(&self, id: &str, task: Task) -> Result<Task> {
        let updated: Option<Task> = self.db.client().update((TABLE, id)).content(task).await?;
        let updated = updated.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        debug!("Updated task {}", id);
        Ok(updated)
    }
}

//! Core task types and operations

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::{Datetime, Thing};

use crate::error::{Result, StoreError};

/// Table holding task records
pub const TABLE: &str = "task";

/// A single to-do item as stored in the `task` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Record id, assigned by the database on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    /// Short title, trimmed and never empty
    pub title: String,
    /// Whether the task is done
    #[serde(default)]
    pub completed: bool,
    /// Optional due date (absent = no due date)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Datetime>,
    /// When the task was created
    pub created_at: Datetime,
    /// When the task was last changed
    pub updated_at: Datetime,
}

impl Task {
    /// Create a new, not yet persisted task
    ///
    /// Fails with [`StoreError::Validation`] when the title is blank.
    pub fn new(title: &str, due_date: Option<DateTime<Utc>>) -> Result<Self> {
        let now = Datetime::from(Utc::now());
        Ok(Self {
            id: None,
            title: normalize_title(title)?,
            completed: false,
            due_date: due_date.map(Datetime::from),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    /// Get the raw record key (the part after `task:`)
    pub fn id_str(&self) -> Option<String> {
        self.id.as_ref().map(|t| t.id.to_raw())
    }

    pub fn due_date_utc(&self) -> Option<DateTime<Utc>> {
        self.due_date.as_ref().map(|d| d.0)
    }

    /// Overdue = has a due date strictly before `now` and is not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date_utc().is_some_and(|due| due < now)
    }

    /// Apply a partial update and bump `updated_at`
    pub fn apply(&mut self, patch: TaskPatch) -> Result<()> {
        if let Some(title) = patch.title {
            self.title = normalize_title(&title)?;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date.map(Datetime::from);
        }
        self.touch();
        Ok(())
    }

    /// Flip `completed` and bump `updated_at`
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
        self.touch();
    }

    // updated_at must move forward even when the clock has not.
    fn touch(&mut self) {
        let previous = self.updated_at.0;
        let now = Utc::now();
        let next = if now > previous {
            now
        } else {
            previous + Duration::nanoseconds(1)
        };
        self.updated_at = Datetime::from(next);
    }
}

/// Fields that may change in an update; `None` leaves the field as is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub completed: Option<bool>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<DateTime<Utc>>>,
}

/// Completion filter applied when listing tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    /// Required value of `completed`, or `None` for no constraint
    pub fn completed(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Active => Some(false),
            Self::Completed => Some(true),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

/// Trim a title and reject it if nothing is left
pub fn normalize_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation("Title is required".to_string()));
    }
    Ok(trimmed.to_string())
}

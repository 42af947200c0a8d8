//! Shared types for the Taskboard web UI
//!
//! These mirror the JSON the API sends and accepts.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Format of a `datetime-local` input value (browser wall-clock time)
const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";
const INPUT_FORMAT_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";

/// Task as returned by the API
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Overdue = due strictly before `now` and not completed; never stored.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due_date.is_some_and(|due| due < now)
    }

    /// Due date in the shape a `datetime-local` input expects ("" when unset)
    pub fn due_input_value(&self) -> String {
        self.due_date
            .map(|due| due.with_timezone(&Local).format(INPUT_FORMAT).to_string())
            .unwrap_or_default()
    }

    /// Human readable due date in the browser's zone
    pub fn due_label(&self) -> Option<String> {
        self.due_date
            .map(|due| due.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
    }
}

/// List filter selected in the UI
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    /// Value of the `filter` query parameter
    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }
}

/// Body of `POST /tasks`
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub due_date: Option<String>,
}

/// Body of `PUT /tasks/:id`
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdate {
    pub title: String,
    /// `None` is sent as `null` and clears the due date
    pub due_date: Option<String>,
}

/// Error body returned by the API
#[derive(Clone, Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// Read a `datetime-local` input value as local wall-clock time.
///
/// Returns `None` for values that don't parse or that fall in a DST gap.
pub fn parse_local_input(value: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value, INPUT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, INPUT_FORMAT_SECONDS))
        .ok()?;
    Local.from_local_datetime(&naive).earliest()
}

/// Turn a `datetime-local` input value into an API due date (`None` when empty).
///
/// Parsed values are sent as RFC 3339 with the local offset; anything else is
/// passed through for the server to reject.
pub fn input_to_due_date(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(
        parse_local_input(value)
            .map(|local| local.to_rfc3339())
            .unwrap_or_else(|| value.to_string()),
    )
}

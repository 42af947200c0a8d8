//! View state for the task list
//!
//! All UI state lives in [`TaskListState`]. Each user action or API reply is an
//! [`Action`]; [`update`] applies it and may hand back an [`Effect`] (an API
//! call) whose outcome comes back as another action. A failed call produces no
//! action, so the state stays as it was before the call.

use crate::types::{input_to_due_date, Filter, NewTask, Task, TaskUpdate};

/// Draft of the new-task form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    /// Raw `datetime-local` value
    pub due_date: String,
}

/// Snapshot of the task being edited
#[derive(Clone, Debug, PartialEq)]
pub struct EditBuffer {
    pub id: String,
    pub title: String,
    pub due_date: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskListState {
    pub tasks: Vec<Task>,
    pub filter: Filter,
    pub new_task: Draft,
    /// `None` = not editing
    pub edit: Option<EditBuffer>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// Reload the list for the current filter
    Refresh,
    SetFilter(Filter),
    Loaded { filter: Filter, tasks: Vec<Task> },

    SetDraftTitle(String),
    SetDraftDueDate(String),
    Submit,
    Created(Task),

    Toggle(String),
    Toggled(Task),

    Delete(String),
    Deleted(String),

    StartEdit(String),
    SetEditTitle(String),
    SetEditDueDate(String),
    SaveEdit,
    Saved(Task),
    CancelEdit,
}

/// API call requested by a state transition
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Fetch(Filter),
    Create(NewTask),
    Toggle(String),
    Delete(String),
    Update { id: String, update: TaskUpdate },
}

/// Apply an action to the state
pub fn update(state: &mut TaskListState, action: Action) -> Option<Effect> {
    match action {
        Action::Refresh => Some(Effect::Fetch(state.filter)),
        Action::SetFilter(filter) => {
            state.filter = filter;
            Some(Effect::Fetch(filter))
        }
        Action::Loaded { filter, tasks } => {
            // A reply for a filter that is no longer selected is stale
            if filter == state.filter {
                state.tasks = tasks;
            }
            None
        }

        Action::SetDraftTitle(title) => {
            state.new_task.title = title;
            None
        }
        Action::SetDraftDueDate(due_date) => {
            state.new_task.due_date = due_date;
            None
        }
        Action::Submit => {
            if state.new_task.title.trim().is_empty() {
                return None;
            }
            Some(Effect::Create(NewTask {
                title: state.new_task.title.clone(),
                due_date: input_to_due_date(&state.new_task.due_date),
            }))
        }
        Action::Created(task) => {
            state.tasks.push(task);
            state.new_task = Draft::default();
            None
        }

        Action::Toggle(id) => Some(Effect::Toggle(id)),
        Action::Toggled(task) => {
            replace_task(&mut state.tasks, task);
            None
        }

        Action::Delete(id) => Some(Effect::Delete(id)),
        Action::Deleted(id) => {
            state.tasks.retain(|t| t.id != id);
            None
        }

        Action::StartEdit(id) => {
            if let Some(task) = state.tasks.iter().find(|t| t.id == id) {
                state.edit = Some(EditBuffer {
                    id: task.id.clone(),
                    title: task.title.clone(),
                    due_date: task.due_input_value(),
                });
            }
            None
        }
        Action::SetEditTitle(title) => {
            if let Some(edit) = state.edit.as_mut() {
                edit.title = title;
            }
            None
        }
        Action::SetEditDueDate(due_date) => {
            if let Some(edit) = state.edit.as_mut() {
                edit.due_date = due_date;
            }
            None
        }
        Action::SaveEdit => state.edit.as_ref().map(|edit| Effect::Update {
            id: edit.id.clone(),
            update: TaskUpdate {
                title: edit.title.clone(),
                due_date: input_to_due_date(&edit.due_date),
            },
        }),
        Action::Saved(task) => {
            if state.edit.as_ref().is_some_and(|edit| edit.id == task.id) {
                state.edit = None;
            }
            replace_task(&mut state.tasks, task);
            None
        }
        Action::CancelEdit => {
            state.edit = None;
            None
        }
    }
}

/// Swap in the server's copy of a task, keeping its position
fn replace_task(tasks: &mut [Task], task: Task) {
    if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
        *slot = task;
    }
}

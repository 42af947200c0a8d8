//! Leptos components for the Taskboard web UI

use chrono::Utc;
use leptos::*;

use crate::api;
use crate::state::{update, Action, TaskListState};
use crate::types::{Filter, Task};

/// Apply an action, then run the API call it asks for (if any).
///
/// The call's reply is dispatched as the next action; failures only reach the
/// browser console.
fn dispatch(set_state: WriteSignal<TaskListState>, action: Action) {
    let mut effect = None;
    set_state.update(|state| effect = update(state, action));

    if let Some(effect) = effect {
        spawn_local(async move {
            match api::perform(effect).await {
                Ok(next) => dispatch(set_state, next),
                Err(e) => logging::error!("Task request failed: {}", e),
            }
        });
    }
}

/// The whole to-do list screen
#[component]
pub fn TaskManager() -> impl IntoView {
    let (state, set_state) = create_signal(TaskListState::default());
    dispatch(set_state, Action::Refresh);

    view! {
        <div class="task-manager">
            <h2>"To-Do List"</h2>

            <FilterBar state=state set_state=set_state/>
            <NewTaskForm state=state set_state=set_state/>

            <Show when=move || state.with(|s| s.edit.is_some())>
                <EditForm state=state set_state=set_state/>
            </Show>

            <ul class="task-list">
                {move || {
                    let now = Utc::now();
                    state
                        .with(|s| s.tasks.clone())
                        .into_iter()
                        .map(|task| view! { <TaskItem task=task now=now set_state=set_state/> })
                        .collect_view()
                }}
            </ul>
        </div>
    }
}

#[component]
fn FilterBar(state: ReadSignal<TaskListState>, set_state: WriteSignal<TaskListState>) -> impl IntoView {
    view! {
        <div class="filters">
            {Filter::ALL
                .into_iter()
                .map(|filter| {
                    view! {
                        <button
                            class:active=move || state.with(|s| s.filter == filter)
                            on:click=move |_| dispatch(set_state, Action::SetFilter(filter))
                        >
                            {filter.label()}
                        </button>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[component]
fn NewTaskForm(state: ReadSignal<TaskListState>, set_state: WriteSignal<TaskListState>) -> impl IntoView {
    view! {
        <form on:submit=move |ev: ev::SubmitEvent| {
            ev.prevent_default();
            dispatch(set_state, Action::Submit);
        }>
            <input
                type="text"
                placeholder="Enter task"
                prop:value=move || state.with(|s| s.new_task.title.clone())
                on:input=move |ev| dispatch(set_state, Action::SetDraftTitle(event_target_value(&ev)))
            />
            <input
                type="datetime-local"
                prop:value=move || state.with(|s| s.new_task.due_date.clone())
                on:input=move |ev| dispatch(set_state, Action::SetDraftDueDate(event_target_value(&ev)))
            />
            <button type="submit">"Add"</button>
        </form>
    }
}

#[component]
fn EditForm(state: ReadSignal<TaskListState>, set_state: WriteSignal<TaskListState>) -> impl IntoView {
    let edit_title = move || state.with(|s| s.edit.as_ref().map(|e| e.title.clone()).unwrap_or_default());
    let edit_due = move || state.with(|s| s.edit.as_ref().map(|e| e.due_date.clone()).unwrap_or_default());

    view! {
        <div class="edit-form">
            <h3>"Edit Task"</h3>
            <form on:submit=move |ev: ev::SubmitEvent| {
                ev.prevent_default();
                dispatch(set_state, Action::SaveEdit);
            }>
                <input
                    type="text"
                    prop:value=edit_title
                    on:input=move |ev| dispatch(set_state, Action::SetEditTitle(event_target_value(&ev)))
                />
                <input
                    type="datetime-local"
                    prop:value=edit_due
                    on:input=move |ev| dispatch(set_state, Action::SetEditDueDate(event_target_value(&ev)))
                />
                <button type="submit">"Save"</button>
                <button type="button" on:click=move |_| dispatch(set_state, Action::CancelEdit)>
                    "Cancel"
                </button>
            </form>
        </div>
    }
}

/// One row of the list
#[component]
fn TaskItem(task: Task, now: chrono::DateTime<Utc>, set_state: WriteSignal<TaskListState>) -> impl IntoView {
    let overdue = task.is_overdue(now);
    let due_label = task.due_label();
    let toggle_id = task.id.clone();
    let edit_id = task.id.clone();
    let delete_id = task.id.clone();

    view! {
        <li class:completed=task.completed>
            <input
                type="checkbox"
                prop:checked=task.completed
                on:change=move |_| dispatch(set_state, Action::Toggle(toggle_id.clone()))
            />
            <span class="title">{task.title}</span>
            {due_label.map(|label| {
                view! {
                    <span class="due-date">
                        "Due: " {label}
                        {overdue.then(|| view! { <span class="overdue">" (OVERDUE)"</span> })}
                    </span>
                }
            })}
            <button on:click=move |_| dispatch(set_state, Action::StartEdit(edit_id.clone()))>"Edit"</button>
            <button on:click=move |_| dispatch(set_state, Action::Delete(delete_id.clone()))>"Delete"</button>
        </li>
    }
}

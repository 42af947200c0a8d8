//! HTTP calls to the Taskboard API
//!
//! [`perform`] runs an [`Effect`] and turns the reply into the [`Action`]
//! that records it.

use crate::state::{Action, Effect};
use crate::types::{Filter, NewTask, Task, TaskUpdate};

/// Base URL of the API, overridable at build time with `TASKBOARD_API_URL`
pub const API_BASE: &str = match option_env!("TASKBOARD_API_URL") {
    Some(url) => url,
    None => "http://localhost:3000/api",
};

pub fn tasks_url(filter: Filter) -> String {
    format!("{}/tasks?filter={}", API_BASE, filter.as_str())
}

pub fn task_url(id: &str) -> String {
    format!("{}/tasks/{}", API_BASE, id)
}

pub fn toggle_url(id: &str) -> String {
    format!("{}/tasks/{}/toggle", API_BASE, id)
}

/// Run an effect and return the action describing its result
pub async fn perform(effect: Effect) -> Result<Action, String> {
    match effect {
        Effect::Fetch(filter) => {
            let tasks = fetch_tasks(filter).await?;
            Ok(Action::Loaded { filter, tasks })
        }
        Effect::Create(new_task) => create_task(&new_task).await.map(Action::Created),
        Effect::Toggle(id) => toggle_task(&id).await.map(Action::Toggled),
        Effect::Delete(id) => {
            delete_task(&id).await?;
            Ok(Action::Deleted(id))
        }
        Effect::Update { id, update } => update_task(&id, &update).await.map(Action::Saved),
    }
}

pub async fn fetch_tasks(filter: Filter) -> Result<Vec<Task>, String> {
    transport::get_json(&tasks_url(filter)).await
}

pub async fn create_task(new_task: &NewTask) -> Result<Task, String> {
    transport::send_json("POST", &format!("{}/tasks", API_BASE), Some(new_task)).await
}

pub async fn toggle_task(id: &str) -> Result<Task, String> {
    transport::send_json::<(), _>("PATCH", &toggle_url(id), None).await
}

pub async fn update_task(id: &str, update: &TaskUpdate) -> Result<Task, String> {
    transport::send_json("PUT", &task_url(id), Some(update)).await
}

pub async fn delete_task(id: &str) -> Result<(), String> {
    let _: serde_json::Value = transport::send_json::<(), _>("DELETE", &task_url(id), None).await?;
    Ok(())
}

#[cfg(feature = "csr")]
mod transport {
    use gloo_net::http::{Request, RequestBuilder, Response};
    use serde::{de::DeserializeOwned, Serialize};

    use crate::types::ApiErrorBody;

    pub async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
        let resp = Request::get(url).send().await.map_err(|e| e.to_string())?;
        read_json(resp).await
    }

    pub async fn send_json<B: Serialize, T: DeserializeOwned>(
        method: &str,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, String> {
        let builder: RequestBuilder = match method {
            "POST" => Request::post(url),
            "PUT" => Request::put(url),
            "PATCH" => Request::patch(url),
            "DELETE" => Request::delete(url),
            other => return Err(format!("Unsupported method: {}", other)),
        };

        let resp = match body {
            Some(body) => builder
                .json(body)
                .map_err(|e| e.to_string())?
                .send()
                .await
                .map_err(|e| e.to_string())?,
            None => builder.send().await.map_err(|e| e.to_string())?,
        };
        read_json(resp).await
    }

    async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, String> {
        if !resp.ok() {
            let status = resp.status();
            return Err(match resp.json::<ApiErrorBody>().await {
                Ok(body) => format!("HTTP {}: {}", status, body.error),
                Err(_) => format!("HTTP {}", status),
            });
        }

        resp.json().await.map_err(|e| e.to_string())
    }
}

#[cfg(not(feature = "csr"))]
mod transport {
    use serde::{de::DeserializeOwned, Serialize};

    pub async fn get_json<T: DeserializeOwned>(_url: &str) -> Result<T, String> {
        Err("HTTP is only available in the browser build".to_string())
    }

    pub async fn send_json<B: Serialize, T: DeserializeOwned>(
        _method: &str,
        _url: &str,
        _body: Option<&B>,
    ) -> Result<T, String> {
        Err("HTTP is only available in the browser build".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        assert!(tasks_url(Filter::Active).ends_with("/tasks?filter=active"));
        assert!(task_url("abc").ends_with("/tasks/abc"));
        assert!(toggle_url("abc").ends_with("/tasks/abc/toggle"));
    }
}

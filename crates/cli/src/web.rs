//! HTTP API for the task store
//!
//! Six task operations under `/api/tasks`, plus a health probe. Handlers are
//! thin: decode the request, call the [`Store`], and render a view model.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, put},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tasks::{Store, StoreError, Task, TaskFilter, TaskPatch};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for web handlers
pub struct WebState {
    pub store: Store,
}

/// Build the API router
pub fn build_router(state: Arc<WebState>, allowed_origins: &[String]) -> Result<Router> {
    let router = Router::new()
        .route("/api/health", get(api_health))
        .route("/api/tasks", get(api_list_tasks).post(api_create_task))
        .route("/api/tasks/upcoming", get(api_upcoming_tasks))
        .route("/api/tasks/:id", put(api_update_task).delete(api_delete_task))
        .route("/api/tasks/:id/toggle", patch(api_toggle_task))
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]))
}

// -----------------------------------------------------------------------------
// Request schemas
// -----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ListQuery {
    filter: Option<String>,
}

impl ListQuery {
    /// Only exact `active`/`completed` narrow the list; anything else lists all.
    fn filter(&self) -> TaskFilter {
        match self.filter.as_deref() {
            Some("active") => TaskFilter::Active,
            Some("completed") => TaskFilter::Completed,
            _ => TaskFilter::All,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    #[serde(default)]
    title: String,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskRequest {
    title: Option<String>,
    completed: Option<bool>,
    /// Absent leaves the due date alone, `null` clears it
    #[serde(default, deserialize_with = "deserialize_due_date_patch")]
    due_date: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskPatch {
            title: req.title,
            completed: req.completed,
            due_date: req.due_date,
        }
    }
}

/// Parse a due date as sent by clients.
///
/// Accepts RFC 3339 and the zone-less `YYYY-MM-DDTHH:MM[:SS]` form of a
/// `datetime-local` input (taken as UTC). Empty means no due date.
fn parse_due_date(raw: &str) -> std::result::Result<Option<DateTime<Utc>>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| format!("Invalid dueDate: {}", raw))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_due_date(&raw).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn deserialize_due_date_patch<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_due_date(deserializer).map(Some)
}

// -----------------------------------------------------------------------------
// View models for API responses
// -----------------------------------------------------------------------------

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskView {
    id: String,
    title: String,
    completed: bool,
    due_date: Option<String>,
    created_at: String,
    updated_at: String,
}

impl From<Task> for TaskView {
    fn from(t: Task) -> Self {
        TaskView {
            id: t.id_str().unwrap_or_default(),
            due_date: t.due_date_utc().map(iso8601),
            created_at: iso8601(t.created_at.0),
            updated_at: iso8601(t.updated_at.0),
            title: t.title,
            completed: t.completed,
        }
    }
}

#[derive(Clone, Serialize)]
struct MessageView {
    message: &'static str,
}

#[derive(Clone, Serialize)]
struct ErrorView {
    error: String,
}

fn iso8601(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn task_views(tasks: Vec<Task>) -> Json<Vec<TaskView>> {
    Json(tasks.into_iter().map(TaskView::from).collect())
}

// -----------------------------------------------------------------------------
// Errors
// -----------------------------------------------------------------------------

/// Error rendered as `{ "error": "..." }` with a matching status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => Self::bad_request(message),
            StoreError::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: "Task not found".to_string(),
            },
            err @ (StoreError::Database(_) | StoreError::Unexpected(_)) => {
                tracing::error!("Task store failure: {}", err);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorView { error: self.message })).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// -----------------------------------------------------------------------------
// API handlers
// -----------------------------------------------------------------------------

async fn api_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn api_list_tasks(
    State(state): State<Arc<WebState>>,
    query: std::result::Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let Query(query) = query?;
    let tasks = state.store.list(query.filter()).await?;
    Ok(task_views(tasks))
}

async fn api_upcoming_tasks(State(state): State<Arc<WebState>>) -> ApiResult<Json<Vec<TaskView>>> {
    let tasks = state.store.upcoming(Utc::now()).await?;
    Ok(task_views(tasks))
}

async fn api_create_task(
    State(state): State<Arc<WebState>>,
    payload: std::result::Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let Json(req) = payload?;
    let task = state.store.insert(&req.title, req.due_date).await?;
    tracing::info!("Created task {}", task.id_str().unwrap_or_default());
    Ok((StatusCode::CREATED, Json(task.into())))
}

async fn api_update_task(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<TaskView>> {
    let Json(req) = payload?;
    tracing::debug!("Update task {}: {:?}", id, req);
    let task = state.store.update(&id, req.into()).await?;
    Ok(Json(task.into()))
}

async fn api_toggle_task(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    let task = state.store.toggle(&id).await?;
    Ok(Json(task.into()))
}

async fn api_delete_task(
    State(state): State<Arc<WebState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageView>> {
    state.store.delete(&id).await?;
    tracing::info!("Deleted task {}", id);
    Ok(Json(MessageView {
        message: "Task deleted",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Duration;
    use db::DatabaseConfig;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const ORIGIN: &str = "http://localhost:4200";

    async fn test_app() -> Router {
        let store = Store::connect(&DatabaseConfig::in_memory(), None)
            .await
            .unwrap();
        build_router(Arc::new(WebState { store }), &[ORIGIN.to_string()]).unwrap()
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, body: Value) -> Value {
        let (status, task) = send(app, "POST", "/api/tasks", Some(body)).await;
        assert_eq!(status, StatusCode::CREATED);
        task
    }

    fn ids(tasks: &Value) -> Vec<String> {
        tasks
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_parse_due_date_forms() {
        let rfc = parse_due_date("2025-03-01T10:30:00.000Z").unwrap().unwrap();
        assert_eq!(iso8601(rfc), "2025-03-01T10:30:00.000Z");

        let offset = parse_due_date("2025-03-01T12:30:00+02:00").unwrap().unwrap();
        assert_eq!(offset, rfc);

        let local = parse_due_date("2025-03-01T10:30").unwrap().unwrap();
        assert_eq!(local, rfc);

        assert_eq!(parse_due_date("").unwrap(), None);
        assert!(parse_due_date("next tuesday").is_err());
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let absent: UpdateTaskRequest = serde_json::from_value(json!({ "title": "x" })).unwrap();
        assert_eq!(absent.due_date, None);

        let cleared: UpdateTaskRequest = serde_json::from_value(json!({ "dueDate": null })).unwrap();
        assert_eq!(cleared.due_date, Some(None));
    }

    #[tokio::test]
    async fn test_end_to_end_lifecycle() {
        let app = test_app().await;

        let task = create(&app, json!({ "title": "Buy milk", "dueDate": null })).await;
        assert_eq!(task["title"], "Buy milk");
        assert_eq!(task["completed"], false);
        assert_eq!(task["dueDate"], Value::Null);
        assert!(task["createdAt"].as_str().unwrap().ends_with('Z'));
        let id = task["id"].as_str().unwrap().to_string();
        assert!(!id.is_empty());

        let (status, toggled) = send(&app, "PATCH", &format!("/api/tasks/{}/toggle", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["completed"], true);

        let (_, completed) = send(&app, "GET", "/api/tasks?filter=completed", None).await;
        assert!(ids(&completed).contains(&id));
        let (_, active) = send(&app, "GET", "/api/tasks?filter=active", None).await;
        assert!(!ids(&active).contains(&id));

        let (status, body) = send(&app, "DELETE", &format!("/api/tasks/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Task deleted" }));

        let (_, all) = send(&app, "GET", "/api/tasks", None).await;
        assert!(!ids(&all).contains(&id));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let app = test_app().await;

        let (status, body) = send(&app, "POST", "/api/tasks", Some(json!({ "title": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Title is required");

        let (status, _) = send(&app, "POST", "/api/tasks", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, all) = send(&app, "GET", "/api/tasks", None).await;
        assert!(all.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_body() {
        let app = test_app().await;

        let request = Request::builder()
            .method("POST")
            .uri("/api/tasks")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            "POST",
            "/api/tasks",
            Some(json!({ "title": "Dated", "dueDate": "someday" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("dueDate"));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let app = test_app().await;
        let open = create(&app, json!({ "title": "Open" })).await;
        let done = create(&app, json!({ "title": "Done" })).await;
        let done_id = done["id"].as_str().unwrap();
        send(&app, "PATCH", &format!("/api/tasks/{}/toggle", done_id), None).await;

        let (_, all) = send(&app, "GET", "/api/tasks?filter=all", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, unfiltered) = send(&app, "GET", "/api/tasks", None).await;
        assert_eq!(ids(&unfiltered), vec![done_id.to_string(), open["id"].as_str().unwrap().to_string()]);

        let (_, active) = send(&app, "GET", "/api/tasks?filter=active", None).await;
        assert_eq!(ids(&active), vec![open["id"].as_str().unwrap().to_string()]);

        let (_, completed) = send(&app, "GET", "/api/tasks?filter=completed", None).await;
        assert_eq!(ids(&completed), vec![done_id.to_string()]);
    }

    #[tokio::test]
    async fn test_unrecognised_filter_lists_everything() {
        let app = test_app().await;
        create(&app, json!({ "title": "Open" })).await;
        let done = create(&app, json!({ "title": "Done" })).await;
        send(&app, "PATCH", &format!("/api/tasks/{}/toggle", done["id"].as_str().unwrap()), None).await;

        for uri in ["/api/tasks?filter=someday", "/api/tasks?filter=", "/api/tasks?filter=Active"] {
            let (status, body) = send(&app, "GET", uri, None).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body.as_array().unwrap().len(), 2, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_upcoming() {
        let app = test_app().await;
        let now = Utc::now();

        let later = create(&app, json!({ "title": "Later", "dueDate": iso8601(now + Duration::days(3)) })).await;
        let soon = create(&app, json!({ "title": "Soon", "dueDate": iso8601(now + Duration::hours(1)) })).await;
        create(&app, json!({ "title": "Late", "dueDate": iso8601(now - Duration::days(1)) })).await;
        create(&app, json!({ "title": "Undated" })).await;
        let done = create(&app, json!({ "title": "Done", "dueDate": iso8601(now + Duration::days(1)) })).await;
        send(&app, "PATCH", &format!("/api/tasks/{}/toggle", done["id"].as_str().unwrap()), None).await;

        let (status, upcoming) = send(&app, "GET", "/api/tasks/upcoming", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            ids(&upcoming),
            vec![
                soon["id"].as_str().unwrap().to_string(),
                later["id"].as_str().unwrap().to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_update() {
        let app = test_app().await;
        let task = create(&app, json!({ "title": "Draft", "dueDate": "2030-01-01T09:00" })).await;
        assert_eq!(task["dueDate"], "2030-01-01T09:00:00.000Z");
        let uri = format!("/api/tasks/{}", task["id"].as_str().unwrap());

        let (status, updated) = send(&app, "PUT", &uri, Some(json!({ "title": "Final", "completed": true }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Final");
        assert_eq!(updated["completed"], true);
        assert_eq!(updated["dueDate"], "2030-01-01T09:00:00.000Z");
        assert_eq!(updated["createdAt"], task["createdAt"]);

        let (_, cleared) = send(&app, "PUT", &uri, Some(json!({ "dueDate": null }))).await;
        assert_eq!(cleared["dueDate"], Value::Null);
        assert_eq!(cleared["title"], "Final");

        let (status, _) = send(&app, "PUT", &uri, Some(json!({ "title": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let app = test_app().await;

        let (status, body) = send(&app, "PUT", "/api/tasks/missing", Some(json!({ "title": "x" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Task not found");

        let (status, _) = send(&app, "PATCH", "/api/tasks/missing/toggle", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/api/tasks/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let app = test_app().await;
        let task = create(&app, json!({ "title": "Flip" })).await;
        let uri = format!("/api/tasks/{}/toggle", task["id"].as_str().unwrap());

        // Timestamps are serialized to the millisecond
        let pause = || tokio::time::sleep(std::time::Duration::from_millis(5));
        pause().await;
        let (_, once) = send(&app, "PATCH", &uri, None).await;
        pause().await;
        let (_, twice) = send(&app, "PATCH", &uri, None).await;
        assert_eq!(once["completed"], true);
        assert_eq!(twice["completed"], false);

        let stamp = |v: &Value| DateTime::parse_from_rfc3339(v["updatedAt"].as_str().unwrap()).unwrap();
        assert!(stamp(&once) > stamp(&task));
        assert!(stamp(&twice) > stamp(&once));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = test_app().await;

        let request = Request::builder()
            .method("OPTIONS")
            .uri("/api/tasks/abc/toggle")
            .header(header::ORIGIN, ORIGIN)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            ORIGIN
        );
        let methods = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("PATCH"));
        assert!(methods.contains("DELETE"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app().await;
        let (status, body) = send(&app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[test]
    fn test_invalid_origin_is_rejected() {
        assert!(cors_layer(&["bad\norigin".to_string()]).is_err());
    }
}

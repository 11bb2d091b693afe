//! Task API endpoints. All routes require an authenticated subject and
//! operate only on that subject's tasks.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{AuthUser, HasAuthState};
use crate::db::{Database, Priority, Task};
use crate::jwt::JwtConfig;

#[derive(Clone)]
pub struct TasksState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl HasAuthState for TasksState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

pub fn router(state: TasksState) -> Router {
    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route("/{id}", put(update_task).delete(delete_task))
        .with_state(state)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskResponse {
    id: String,
    title: String,
    description: String,
    due_date: Option<String>,
    priority: Priority,
    tags: Vec<String>,
    completed: bool,
    created_at: String,
    updated_at: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.uuid,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            tags: task.tags,
            completed: task.completed,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    due_date: Option<String>,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    tags: Vec<String>,
}

async fn create_task(
    State(state): State<TasksState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }

    let uuid = uuid::Uuid::new_v4().to_string();

    state
        .db
        .tasks()
        .create(
            &uuid,
            &claims.sub,
            title,
            &payload.description,
            payload.due_date.as_deref(),
            payload.priority,
            &payload.tags,
        )
        .await
        .db_err("Failed to create task")?;

    let task = state
        .db
        .tasks()
        .get_for_user(&uuid, &claims.sub)
        .await
        .db_err("Failed to load task")?
        .ok_or_else(|| ApiError::internal("Server error"))?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

async fn list_tasks(
    State(state): State<TasksState>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let tasks = state
        .db
        .tasks()
        .list_for_user(&claims.sub)
        .await
        .db_err("Failed to list tasks")?;

    let tasks: Vec<TaskResponse> = tasks.into_iter().map(TaskResponse::from).collect();
    Ok(Json(tasks))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTaskRequest {
    title: Option<String>,
    description: Option<String>,
    due_date: Option<String>,
    priority: Option<Priority>,
    tags: Option<Vec<String>>,
    completed: Option<bool>,
}

/// Update only the provided fields of a task.
async fn update_task(
    State(state): State<TasksState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut task = state
        .db
        .tasks()
        .get_for_user(&id, &claims.sub)
        .await
        .db_err("Failed to load task")?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    if let Some(title) = payload.title {
        task.title = title;
    }
    if let Some(description) = payload.description {
        task.description = description;
    }
    if let Some(due_date) = payload.due_date {
        task.due_date = Some(due_date);
    }
    if let Some(priority) = payload.priority {
        task.priority = priority;
    }
    if let Some(tags) = payload.tags {
        task.tags = tags;
    }
    if let Some(completed) = payload.completed {
        task.completed = completed;
    }

    state
        .db
        .tasks()
        .update(&task)
        .await
        .db_err("Failed to update task")?;

    // Re-read for the refreshed updated_at timestamp
    let task = state
        .db
        .tasks()
        .get_for_user(&id, &claims.sub)
        .await
        .db_err("Failed to load task")?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    Ok(Json(TaskResponse::from(task)))
}

#[derive(Serialize)]
struct DeleteResponse {
    message: &'static str,
}

async fn delete_task(
    State(state): State<TasksState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = state
        .db
        .tasks()
        .delete_for_user(&id, &claims.sub)
        .await
        .db_err("Failed to delete task")?;

    if !deleted {
        return Err(ApiError::not_found("Task not found"));
    }

    Ok(Json(DeleteResponse {
        message: "Task deleted successfully",
    }))
}

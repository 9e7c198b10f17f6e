use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::use_cases::todo::tasks::{TodoChanges, TodoTasks};
use crate::application::validation::Validator;
use crate::bootstrap::app_context::AppContext;
use crate::domain::todo::task::{TodoPriority, TodoTask};
use crate::presentation::http::auth::AuthUser;
use crate::presentation::http::error::{ApiJson, ApiResult, ErrorBody};
use crate::presentation::http::{Page, TodoPage, double_option, paged};

#[derive(Debug, Serialize, ToSchema)]
pub struct TodoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<TodoTask> for TodoResponse {
    fn from(t: TodoTask) -> Self {
        Self {
            id: t.id,
            title: t.title,
            description: t.description,
            priority: t.priority.as_str().to_string(),
            due_date: t.due_date,
            completed: t.completed,
            completed_at: t.completed_at,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTodoRequest {
    pub title: String,
    pub description: Option<String>,
    /// low, medium or high; defaults to medium
    pub priority: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<NaiveDate>)]
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTodosQuery {
    pub completed: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/tasks", post(create_todo).get(list_todos))
        .route(
            "/tasks/:id",
            get(get_todo).patch(update_todo).delete(delete_todo),
        )
        .route("/tasks/:id/toggle", post(toggle_todo))
        .with_state(ctx)
}

fn parse_priority(raw: Option<&str>) -> ApiResult<Option<TodoPriority>> {
    Ok(raw.map(|p| p.trim().parse::<TodoPriority>()).transpose()?)
}

#[utoipa::path(post, path = "/api/v1/todo/tasks", tag = "Todo", request_body = CreateTodoRequest, responses(
    (status = 201, body = TodoResponse),
    (status = 400, body = ErrorBody)
))]
pub async fn create_todo(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateTodoRequest>,
) -> ApiResult<(StatusCode, Json<TodoResponse>)> {
    Validator::new()
        .length("title", &req.title, 1, 200)
        .optional_length("description", req.description.as_deref(), 0, 2_000)
        .finish()?;
    let priority = parse_priority(req.priority.as_deref())?.unwrap_or(TodoPriority::Medium);
    let repo = ctx.todo_repo();
    let uc = TodoTasks {
        repo: repo.as_ref(),
    };
    let task = uc
        .create(auth.id, &req.title, req.description, priority, req.due_date)
        .await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[utoipa::path(get, path = "/api/v1/todo/tasks", tag = "Todo", params(ListTodosQuery), responses(
    (status = 200, body = TodoPage)
))]
pub async fn list_todos(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(q): Query<ListTodosQuery>,
) -> ApiResult<Json<Page<TodoResponse>>> {
    let repo = ctx.todo_repo();
    let uc = TodoTasks {
        repo: repo.as_ref(),
    };
    let page = uc
        .list(auth.id, q.completed, paged(q.page, q.limit))
        .await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(get, path = "/api/v1/todo/tasks/{id}", tag = "Todo",
    params(("id" = Uuid, Path, description = "Task id")),
    responses((status = 200, body = TodoResponse), (status = 404, body = ErrorBody)))]
pub async fn get_todo(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TodoResponse>> {
    let repo = ctx.todo_repo();
    let uc = TodoTasks {
        repo: repo.as_ref(),
    };
    Ok(Json(uc.get(auth.id, id).await?.into()))
}

#[utoipa::path(patch, path = "/api/v1/todo/tasks/{id}", tag = "Todo", request_body = UpdateTodoRequest,
    params(("id" = Uuid, Path, description = "Task id")),
    responses((status = 200, body = TodoResponse), (status = 400, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn update_todo(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateTodoRequest>,
) -> ApiResult<Json<TodoResponse>> {
    Validator::new()
        .optional_length("title", req.title.as_deref(), 1, 200)
        .optional_length(
            "description",
            req.description.as_ref().and_then(|d| d.as_deref()),
            0,
            2_000,
        )
        .finish()?;
    let changes = TodoChanges {
        title: req.title,
        description: req.description,
        priority: parse_priority(req.priority.as_deref())?,
        due_date: req.due_date,
        completed: req.completed,
    };
    let repo = ctx.todo_repo();
    let uc = TodoTasks {
        repo: repo.as_ref(),
    };
    Ok(Json(uc.update(auth.id, id, changes).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/todo/tasks/{id}/toggle", tag = "Todo",
    params(("id" = Uuid, Path, description = "Task id")),
    responses((status = 200, body = TodoResponse), (status = 404, body = ErrorBody)))]
pub async fn toggle_todo(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<TodoResponse>> {
    let repo = ctx.todo_repo();
    let uc = TodoTasks {
        repo: repo.as_ref(),
    };
    Ok(Json(uc.toggle(auth.id, id).await?.into()))
}

#[utoipa::path(delete, path = "/api/v1/todo/tasks/{id}", tag = "Todo",
    params(("id" = Uuid, Path, description = "Task id")),
    responses((status = 204), (status = 404, body = ErrorBody)))]
pub async fn delete_todo(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = ctx.todo_repo();
    let uc = TodoTasks {
        repo: repo.as_ref(),
    };
    uc.delete(auth.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

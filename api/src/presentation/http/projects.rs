use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::ports::project_repository::{TaskFilter, TaskPatch};
use crate::application::use_cases::projects::projects::Projects;
use crate::application::use_cases::projects::sprints::{SprintCompletion, Sprints};
use crate::application::use_cases::projects::tasks::{TaskDraft, Tasks};
use crate::application::validation::Validator;
use crate::bootstrap::app_context::AppContext;
use crate::domain::projects::project::{JoinRequest, Member, Project};
use crate::domain::projects::sprint::Sprint;
use crate::domain::projects::task::{Priority, Task, TaskStatus};
use crate::presentation::http::auth::AuthUser;
use crate::presentation::http::error::{ApiError, ApiJson, ApiResult, ErrorBody};
use crate::presentation::http::{UserRef, double_option};

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectResponse {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(p: Project) -> Self {
        Self {
            id: p.id,
            key: p.key,
            name: p.name,
            description: p.description,
            owner_id: p.owner_id,
            created_at: p.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberResponse {
    pub user: UserRef,
    pub role: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl From<Member> for MemberResponse {
    fn from(m: Member) -> Self {
        Self {
            user: m.user.into(),
            role: m.role.as_str().to_string(),
            joined_at: m.joined_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRequestResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user: UserRef,
    pub message: Option<String>,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub decided_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<JoinRequest> for JoinRequestResponse {
    fn from(r: JoinRequest) -> Self {
        Self {
            id: r.id,
            project_id: r.project_id,
            user: r.user.into(),
            message: r.message,
            status: r.status.as_str().to_string(),
            created_at: r.created_at,
            decided_at: r.decided_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SprintResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Sprint> for SprintResponse {
    fn from(s: Sprint) -> Self {
        Self {
            id: s.id,
            project_id: s.project_id,
            name: s.name,
            goal: s.goal,
            start_date: s.start_date,
            end_date: s.end_date,
            status: s.status.as_str().to_string(),
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SprintCompletionResponse {
    pub sprint: SprintResponse,
    /// Unfinished tasks returned to the backlog
    pub moved_to_backlog: u64,
}

impl From<SprintCompletion> for SprintCompletionResponse {
    fn from(c: SprintCompletion) -> Self {
        Self {
            sprint: c.sprint.into(),
            moved_to_backlog: c.moved_to_backlog,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TaskResponse {
    pub id: Uuid,
    pub project_id: Uuid,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub sprint_id: Option<Uuid>,
    pub assignee: Option<UserRef>,
    pub reporter: UserRef,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Task> for TaskResponse {
    fn from(t: Task) -> Self {
        Self {
            id: t.id,
            project_id: t.project_id,
            key: t.key,
            title: t.title,
            description: t.description,
            status: t.status.to_string(),
            priority: t.priority.as_str().to_string(),
            sprint_id: t.sprint_id,
            assignee: t.assignee.map(Into::into),
            reporter: t.reporter.into(),
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProjectRequest {
    /// 2-10 upper-case letters or digits, starting with a letter
    pub key: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinProjectRequest {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSprintRequest {
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    /// low, medium, high or critical
    pub priority: Option<String>,
    pub sprint_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// todo, in_progress, in_review or done
    pub status: Option<String>,
    pub priority: Option<String>,
    /// `null` moves the task to the backlog
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub sprint_id: Option<Option<Uuid>>,
    /// `null` unassigns
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub assignee_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignTaskRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub assignee_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListTasksQuery {
    pub status: Option<String>,
    /// Sprint id, or `backlog` for tasks outside any sprint
    pub sprint: Option<String>,
    pub assignee: Option<Uuid>,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route("/:project_id", get(get_project))
        .route("/:project_id/members", get(list_members))
        .route("/:project_id/members/:user_id", delete(remove_member))
        .route(
            "/:project_id/join-requests",
            post(request_to_join).get(list_join_requests),
        )
        .route(
            "/:project_id/join-requests/:request_id/approve",
            post(approve_join_request),
        )
        .route(
            "/:project_id/join-requests/:request_id/reject",
            post(reject_join_request),
        )
        .route("/:project_id/sprints", post(create_sprint).get(list_sprints))
        .route("/:project_id/sprints/:sprint_id/start", post(start_sprint))
        .route(
            "/:project_id/sprints/:sprint_id/complete",
            post(complete_sprint),
        )
        .route("/:project_id/tasks", post(create_task).get(list_tasks))
        .route(
            "/:project_id/tasks/:key",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/:project_id/tasks/:key/assignee", post(assign_task))
        .with_state(ctx)
}

fn parse_priority(raw: Option<&str>) -> ApiResult<Option<Priority>> {
    Ok(raw.map(|p| p.trim().parse::<Priority>()).transpose()?)
}

fn parse_status(raw: Option<&str>) -> ApiResult<Option<TaskStatus>> {
    Ok(raw.map(|s| s.trim().parse::<TaskStatus>()).transpose()?)
}

fn check_task_text(title: Option<&str>, description: Option<&str>) -> ApiResult<()> {
    Validator::new()
        .optional_length("title", title, 1, 200)
        .optional_length("description", description, 0, 10_000)
        .finish()?;
    Ok(())
}

// --- Projects & membership ---

#[utoipa::path(post, path = "/api/v1/projects", tag = "Projects", request_body = CreateProjectRequest, responses(
    (status = 201, body = ProjectResponse),
    (status = 400, body = ErrorBody),
    (status = 409, body = ErrorBody)
))]
pub async fn create_project(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectResponse>)> {
    Validator::new()
        .length("name", &req.name, 1, 120)
        .optional_length("description", req.description.as_deref(), 0, 2_000)
        .finish()?;
    let repo = ctx.project_repo();
    let uc = Projects {
        repo: repo.as_ref(),
    };
    let project = uc
        .create(auth.id, &req.key, &req.name, req.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

#[utoipa::path(get, path = "/api/v1/projects", tag = "Projects", responses(
    (status = 200, body = [ProjectResponse])
))]
pub async fn list_projects(
    State(ctx): State<AppContext>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<ProjectResponse>>> {
    let repo = ctx.project_repo();
    let uc = Projects {
        repo: repo.as_ref(),
    };
    let items = uc.list_mine(auth.id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(get, path = "/api/v1/projects/{project_id}", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses((status = 200, body = ProjectResponse), (status = 404, body = ErrorBody)))]
pub async fn get_project(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<ProjectResponse>> {
    let repo = ctx.project_repo();
    let uc = Projects {
        repo: repo.as_ref(),
    };
    Ok(Json(uc.get(auth.id, project_id).await?.into()))
}

#[utoipa::path(get, path = "/api/v1/projects/{project_id}/members", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses((status = 200, body = [MemberResponse]), (status = 404, body = ErrorBody)))]
pub async fn list_members(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<MemberResponse>>> {
    let repo = ctx.project_repo();
    let uc = Projects {
        repo: repo.as_ref(),
    };
    let items = uc.members(auth.id, project_id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(delete, path = "/api/v1/projects/{project_id}/members/{user_id}", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id"), ("user_id" = Uuid, Path, description = "Member user id")),
    responses((status = 204), (status = 400, body = ErrorBody), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn remove_member(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let repo = ctx.project_repo();
    let uc = Projects {
        repo: repo.as_ref(),
    };
    uc.remove_member(auth.id, project_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/v1/projects/{project_id}/join-requests", tag = "Projects", request_body = JoinProjectRequest,
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses((status = 201, body = JoinRequestResponse), (status = 404, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn request_to_join(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<JoinProjectRequest>,
) -> ApiResult<(StatusCode, Json<JoinRequestResponse>)> {
    Validator::new()
        .optional_length("message", req.message.as_deref(), 0, 500)
        .finish()?;
    let repo = ctx.project_repo();
    let uc = Projects {
        repo: repo.as_ref(),
    };
    let request = uc
        .request_to_join(auth.id, project_id, req.message.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(request.into())))
}

#[utoipa::path(get, path = "/api/v1/projects/{project_id}/join-requests", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses((status = 200, body = [JoinRequestResponse]), (status = 403, body = ErrorBody)))]
pub async fn list_join_requests(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<JoinRequestResponse>>> {
    let repo = ctx.project_repo();
    let uc = Projects {
        repo: repo.as_ref(),
    };
    let items = uc.pending_requests(auth.id, project_id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

async fn decide(
    ctx: AppContext,
    auth: AuthUser,
    project_id: Uuid,
    request_id: Uuid,
    approve: bool,
) -> ApiResult<Json<JoinRequestResponse>> {
    let repo = ctx.project_repo();
    let uc = Projects {
        repo: repo.as_ref(),
    };
    let request = uc.decide(auth.id, project_id, request_id, approve).await?;
    Ok(Json(request.into()))
}

#[utoipa::path(post, path = "/api/v1/projects/{project_id}/join-requests/{request_id}/approve", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id"), ("request_id" = Uuid, Path, description = "Join request id")),
    responses((status = 200, body = JoinRequestResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn approve_join_request(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, request_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<JoinRequestResponse>> {
    decide(ctx, auth, project_id, request_id, true).await
}

#[utoipa::path(post, path = "/api/v1/projects/{project_id}/join-requests/{request_id}/reject", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id"), ("request_id" = Uuid, Path, description = "Join request id")),
    responses((status = 200, body = JoinRequestResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn reject_join_request(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, request_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<JoinRequestResponse>> {
    decide(ctx, auth, project_id, request_id, false).await
}

// --- Sprints ---

#[utoipa::path(post, path = "/api/v1/projects/{project_id}/sprints", tag = "Projects", request_body = CreateSprintRequest,
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses((status = 201, body = SprintResponse), (status = 400, body = ErrorBody), (status = 403, body = ErrorBody)))]
pub async fn create_sprint(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateSprintRequest>,
) -> ApiResult<(StatusCode, Json<SprintResponse>)> {
    Validator::new()
        .length("name", &req.name, 1, 120)
        .optional_length("goal", req.goal.as_deref(), 0, 1_000)
        .finish()?;
    let repo = ctx.project_repo();
    let uc = Sprints {
        repo: repo.as_ref(),
    };
    let sprint = uc
        .create(
            auth.id,
            project_id,
            &req.name,
            req.goal.as_deref(),
            req.start_date,
            req.end_date,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(sprint.into())))
}

#[utoipa::path(get, path = "/api/v1/projects/{project_id}/sprints", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses((status = 200, body = [SprintResponse]), (status = 404, body = ErrorBody)))]
pub async fn list_sprints(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Json<Vec<SprintResponse>>> {
    let repo = ctx.project_repo();
    let uc = Sprints {
        repo: repo.as_ref(),
    };
    let items = uc.list(auth.id, project_id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(post, path = "/api/v1/projects/{project_id}/sprints/{sprint_id}/start", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id"), ("sprint_id" = Uuid, Path, description = "Sprint id")),
    responses((status = 200, body = SprintResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn start_sprint(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, sprint_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<SprintResponse>> {
    let repo = ctx.project_repo();
    let uc = Sprints {
        repo: repo.as_ref(),
    };
    Ok(Json(uc.start(auth.id, project_id, sprint_id).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/projects/{project_id}/sprints/{sprint_id}/complete", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id"), ("sprint_id" = Uuid, Path, description = "Sprint id")),
    responses((status = 200, body = SprintCompletionResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn complete_sprint(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, sprint_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<SprintCompletionResponse>> {
    let repo = ctx.project_repo();
    let uc = Sprints {
        repo: repo.as_ref(),
    };
    Ok(Json(
        uc.complete(auth.id, project_id, sprint_id).await?.into(),
    ))
}

// --- Tasks ---

#[utoipa::path(post, path = "/api/v1/projects/{project_id}/tasks", tag = "Projects", request_body = CreateTaskRequest,
    params(("project_id" = Uuid, Path, description = "Project id")),
    responses((status = 201, body = TaskResponse), (status = 404, body = ErrorBody), (status = 422, body = ErrorBody)))]
pub async fn create_task(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    check_task_text(Some(&req.title), req.description.as_deref())?;
    let priority = parse_priority(req.priority.as_deref())?.unwrap_or(Priority::Medium);
    let repo = ctx.project_repo();
    let counters = ctx.counter_repo();
    let uc = Tasks {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let draft = TaskDraft {
        title: req.title,
        description: req.description,
        priority,
        sprint_id: req.sprint_id,
        assignee_id: req.assignee_id,
    };
    let task = uc.create(auth.id, project_id, draft).await?;
    Ok((StatusCode::CREATED, Json(task.into())))
}

#[utoipa::path(get, path = "/api/v1/projects/{project_id}/tasks", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id"), ListTasksQuery),
    responses((status = 200, body = [TaskResponse]), (status = 404, body = ErrorBody)))]
pub async fn list_tasks(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(project_id): Path<Uuid>,
    Query(q): Query<ListTasksQuery>,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let status = parse_status(q.status.as_deref())?;
    let (sprint_id, backlog_only) = match q.sprint.as_deref().map(str::trim) {
        None | Some("") => (None, false),
        Some("backlog") => (None, true),
        Some(raw) => {
            let id = Uuid::parse_str(raw).map_err(|_| {
                ApiError::new(StatusCode::BAD_REQUEST, "sprint must be a uuid or 'backlog'")
            })?;
            (Some(id), false)
        }
    };
    let repo = ctx.project_repo();
    let counters = ctx.counter_repo();
    let uc = Tasks {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    let filter = TaskFilter {
        status,
        sprint_id,
        backlog_only,
        assignee_id: q.assignee,
    };
    let items = uc.list(auth.id, project_id, filter).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(get, path = "/api/v1/projects/{project_id}/tasks/{key}", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id"), ("key" = String, Path, description = "Task key, e.g. PRJ-3")),
    responses((status = 200, body = TaskResponse), (status = 404, body = ErrorBody)))]
pub async fn get_task(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, key)): Path<(Uuid, String)>,
) -> ApiResult<Json<TaskResponse>> {
    let repo = ctx.project_repo();
    let counters = ctx.counter_repo();
    let uc = Tasks {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    Ok(Json(uc.get(auth.id, project_id, &key).await?.into()))
}

#[utoipa::path(patch, path = "/api/v1/projects/{project_id}/tasks/{key}", tag = "Projects", request_body = UpdateTaskRequest,
    params(("project_id" = Uuid, Path, description = "Project id"), ("key" = String, Path, description = "Task key")),
    responses((status = 200, body = TaskResponse), (status = 404, body = ErrorBody), (status = 422, body = ErrorBody)))]
pub async fn update_task(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, key)): Path<(Uuid, String)>,
    ApiJson(req): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    check_task_text(
        req.title.as_deref(),
        req.description.as_ref().and_then(|d| d.as_deref()),
    )?;
    let patch = TaskPatch {
        title: req.title,
        description: req.description,
        status: parse_status(req.status.as_deref())?,
        priority: parse_priority(req.priority.as_deref())?,
        sprint_id: req.sprint_id,
        assignee_id: req.assignee_id,
    };
    let repo = ctx.project_repo();
    let counters = ctx.counter_repo();
    let uc = Tasks {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    Ok(Json(uc.update(auth.id, project_id, &key, patch).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/projects/{project_id}/tasks/{key}/assignee", tag = "Projects", request_body = AssignTaskRequest,
    params(("project_id" = Uuid, Path, description = "Project id"), ("key" = String, Path, description = "Task key")),
    responses((status = 200, body = TaskResponse), (status = 404, body = ErrorBody), (status = 422, body = ErrorBody)))]
pub async fn assign_task(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, key)): Path<(Uuid, String)>,
    ApiJson(req): ApiJson<AssignTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    let patch = TaskPatch {
        assignee_id: Some(req.assignee_id.flatten()),
        ..TaskPatch::default()
    };
    let repo = ctx.project_repo();
    let counters = ctx.counter_repo();
    let uc = Tasks {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    Ok(Json(uc.update(auth.id, project_id, &key, patch).await?.into()))
}

#[utoipa::path(delete, path = "/api/v1/projects/{project_id}/tasks/{key}", tag = "Projects",
    params(("project_id" = Uuid, Path, description = "Project id"), ("key" = String, Path, description = "Task key")),
    responses((status = 204), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn delete_task(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((project_id, key)): Path<(Uuid, String)>,
) -> ApiResult<StatusCode> {
    let repo = ctx.project_repo();
    let counters = ctx.counter_repo();
    let uc = Tasks {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
    };
    uc.delete(auth.id, project_id, &key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::presentation::http::testing::{TestApp, error_fields, send};

    async fn project(app: &Router, token: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/",
            token,
            Some(json!({"key": "core", "name": "Core"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["key"], "CORE");
        body["id"].as_str().unwrap().to_string()
    }

    async fn join(app: &Router, t: &TestApp, project_id: &str, n: usize) {
        let uri = format!("/{project_id}/join-requests");
        let (status, req) = send(app, "POST", &uri, &t.token(n), Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let approve = format!("{uri}/{}/approve", req["id"].as_str().unwrap());
        let (status, decided) = send(app, "POST", &approve, &t.token(0), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(decided["status"], "approved");
    }

    #[tokio::test]
    async fn keys_are_checked_and_membership_hides_projects() {
        let t = TestApp::new(&["ann", "bob"]);
        let app = routes(t.ctx.clone());

        let (status, _) = send(&app, "POST", "/", &t.token(0), Some(json!({"key": "1x", "name": "Bad"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = send(&app, "POST", "/", &t.token(0), Some(json!({"key": "CORE", "name": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_fields(&body), vec!["name"]);

        let id = project(&app, &t.token(0)).await;
        let (status, _) = send(&app, "POST", "/", &t.token(1), Some(json!({"key": "CORE", "name": "Again"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, "GET", &format!("/{id}"), &t.token(1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let requests = format!("/{id}/join-requests");
        let (status, _) = send(&app, "POST", &requests, &t.token(1), Some(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = send(&app, "POST", &requests, &t.token(1), Some(json!({}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(&app, "GET", &requests, &t.token(1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn a_second_sprint_cannot_start_while_one_is_active() {
        let t = TestApp::new(&["ann"]);
        let app = routes(t.ctx.clone());
        let id = project(&app, &t.token(0)).await;
        let sprints = format!("/{id}/sprints");
        let sprint = |name: &str, start: &str, end: &str| {
            json!({"name": name, "start_date": start, "end_date": end})
        };

        let (status, _) = send(
            &app,
            "POST",
            &sprints,
            &t.token(0),
            Some(sprint("S0", "2024-03-10", "2024-03-09")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut ids = Vec::new();
        for (name, start, end) in [("S1", "2024-03-01", "2024-03-14"), ("S2", "2024-03-15", "2024-03-28")] {
            let (status, body) = send(&app, "POST", &sprints, &t.token(0), Some(sprint(name, start, end))).await;
            assert_eq!(status, StatusCode::CREATED);
            ids.push(body["id"].as_str().unwrap().to_string());
        }

        let (status, started) = send(&app, "POST", &format!("{sprints}/{}/start", ids[0]), &t.token(0), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["status"], "active");
        let (status, _) = send(&app, "POST", &format!("{sprints}/{}/start", ids[1]), &t.token(0), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = send(&app, "POST", &format!("{sprints}/{}/start", Uuid::new_v4()), &t.token(0), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn removed_members_lose_their_assignments() {
        let t = TestApp::new(&["ann", "bob", "cy"]);
        let app = routes(t.ctx.clone());
        let id = project(&app, &t.token(0)).await;
        join(&app, &t, &id, 1).await;
        let (bob, cy) = (t.users[1].id, t.users[2].id);

        let tasks = format!("/{id}/tasks");
        let (status, task) = send(
            &app,
            "POST",
            &tasks,
            &t.token(0),
            Some(json!({"title": "ship it", "assignee_id": bob})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(task["key"], "CORE-1");
        assert_eq!(task["assignee"]["id"], json!(bob));

        let (status, _) = send(
            &app,
            "POST",
            &format!("{tasks}/CORE-1/assignee"),
            &t.token(0),
            Some(json!({"assignee_id": cy})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, "DELETE", &format!("/{id}/members/{}", t.users[0].id), &t.token(0), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(&app, "DELETE", &format!("/{id}/members/{bob}"), &t.token(0), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, task) = send(&app, "GET", &format!("{tasks}/CORE-1"), &t.token(0), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(task["assignee"].is_null());
    }
}

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::ports::issues_repository::IssueFilter;
use crate::application::use_cases::issues::issue_tracker::{IssueDetail, IssueDraft, IssueTracker};
use crate::application::use_cases::issues::pull_requests::{
    PullRequestDetail, PullRequestDraft, PullRequests,
};
use crate::application::use_cases::issues::repositories::Repositories;
use crate::application::validation::Validator;
use crate::bootstrap::app_context::AppContext;
use crate::domain::issues::issue::{Issue, IssueComment, IssueState};
use crate::domain::issues::pull_request::{PullRequest, PullRequestState};
use crate::domain::issues::repository::{Label, Repository};
use crate::domain::issues::timeline::TimelineEvent;
use crate::presentation::http::auth::AuthUser;
use crate::presentation::http::error::{ApiJson, ApiResult, ErrorBody};
use crate::presentation::http::{
    IssuePage, Page, PullRequestPage, UserRef, double_option, paged,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct RepositoryResponse {
    pub id: Uuid,
    pub owner: UserRef,
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Repository> for RepositoryResponse {
    fn from(r: Repository) -> Self {
        Self {
            id: r.id,
            owner: r.owner.into(),
            name: r.name,
            description: r.description,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LabelResponse {
    pub id: Uuid,
    pub name: String,
    pub color: String,
}

impl From<Label> for LabelResponse {
    fn from(l: Label) -> Self {
        Self {
            id: l.id,
            name: l.name,
            color: l.color,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueResponse {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub number: i64,
    pub author: UserRef,
    pub title: String,
    pub body: String,
    pub state: String,
    pub assignee: Option<UserRef>,
    pub labels: Vec<LabelResponse>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<Issue> for IssueResponse {
    fn from(i: Issue) -> Self {
        Self {
            id: i.id,
            repository_id: i.repository_id,
            number: i.number,
            author: i.author.into(),
            title: i.title,
            body: i.body,
            state: i.state.to_string(),
            assignee: i.assignee.map(Into::into),
            labels: i.labels.into_iter().map(Into::into).collect(),
            created_at: i.created_at,
            updated_at: i.updated_at,
            closed_at: i.closed_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueCommentResponse {
    pub id: Uuid,
    pub author: UserRef,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<IssueComment> for IssueCommentResponse {
    fn from(c: IssueComment) -> Self {
        Self {
            id: c.id,
            author: c.author.into(),
            body: c.body,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimelineEventResponse {
    pub id: Uuid,
    pub actor: UserRef,
    pub kind: String,
    pub message: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<TimelineEvent> for TimelineEventResponse {
    fn from(e: TimelineEvent) -> Self {
        Self {
            id: e.id,
            actor: e.actor.into(),
            kind: e.kind,
            message: e.message,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IssueDetailResponse {
    #[serde(flatten)]
    pub issue: IssueResponse,
    pub comments: Vec<IssueCommentResponse>,
    pub timeline: Vec<TimelineEventResponse>,
}

impl From<IssueDetail> for IssueDetailResponse {
    fn from(d: IssueDetail) -> Self {
        Self {
            issue: d.issue.into(),
            comments: d.comments.into_iter().map(Into::into).collect(),
            timeline: d.timeline.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PullRequestResponse {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub number: i64,
    pub author: UserRef,
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
    pub state: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub merged_at: Option<chrono::DateTime<chrono::Utc>>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<PullRequest> for PullRequestResponse {
    fn from(p: PullRequest) -> Self {
        Self {
            id: p.id,
            repository_id: p.repository_id,
            number: p.number,
            author: p.author.into(),
            title: p.title,
            body: p.body,
            head: p.head,
            base: p.base,
            state: p.state.to_string(),
            created_at: p.created_at,
            updated_at: p.updated_at,
            merged_at: p.merged_at,
            closed_at: p.closed_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PullRequestDetailResponse {
    #[serde(flatten)]
    pub pull_request: PullRequestResponse,
    pub timeline: Vec<TimelineEventResponse>,
}

impl From<PullRequestDetail> for PullRequestDetailResponse {
    fn from(d: PullRequestDetail) -> Self {
        Self {
            pull_request: d.pull_request.into(),
            timeline: d.timeline.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRepositoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateLabelRequest {
    pub name: String,
    /// `#rrggbb`
    pub color: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateIssueRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub assignee_id: Option<Uuid>,
    #[serde(default)]
    pub label_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct EditIssueRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRequest {
    /// `null` unassigns
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub assignee_id: Option<Option<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LabelRefRequest {
    pub label_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenPullRequestRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListIssuesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// open or closed
    pub state: Option<String>,
    /// Label name
    pub label: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPullRequestsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// open, closed or merged
    pub state: Option<String>,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/repositories", post(create_repository).get(list_repositories))
        .route("/repositories/:repo_id", get(get_repository))
        .route(
            "/repositories/:repo_id/labels",
            post(create_label).get(list_labels),
        )
        .route(
            "/repositories/:repo_id/labels/:label_id",
            delete(delete_label),
        )
        .route(
            "/repositories/:repo_id/issues",
            post(open_issue).get(list_issues),
        )
        .route(
            "/repositories/:repo_id/issues/:number",
            get(get_issue).patch(edit_issue),
        )
        .route("/repositories/:repo_id/issues/:number/close", post(close_issue))
        .route("/repositories/:repo_id/issues/:number/reopen", post(reopen_issue))
        .route("/repositories/:repo_id/issues/:number/assignee", post(assign_issue))
        .route("/repositories/:repo_id/issues/:number/labels", post(add_issue_label))
        .route(
            "/repositories/:repo_id/issues/:number/labels/:label_id",
            delete(remove_issue_label),
        )
        .route(
            "/repositories/:repo_id/issues/:number/comments",
            post(comment_issue),
        )
        .route(
            "/repositories/:repo_id/pulls",
            post(open_pull_request).get(list_pull_requests),
        )
        .route("/repositories/:repo_id/pulls/:number", get(get_pull_request))
        .route("/repositories/:repo_id/pulls/:number/merge", post(merge_pull_request))
        .route("/repositories/:repo_id/pulls/:number/close", post(close_pull_request))
        .route("/repositories/:repo_id/pulls/:number/reopen", post(reopen_pull_request))
        .with_state(ctx)
}

fn check_issue_text(title: Option<&str>, body: Option<&str>) -> ApiResult<()> {
    Validator::new()
        .optional_length("title", title, 1, 256)
        .optional_length("body", body, 0, 65_536)
        .finish()?;
    Ok(())
}

// --- Repositories & labels ---

#[utoipa::path(post, path = "/api/v1/issues/repositories", tag = "Issues", request_body = CreateRepositoryRequest, responses(
    (status = 201, body = RepositoryResponse),
    (status = 400, body = ErrorBody),
    (status = 409, body = ErrorBody)
))]
pub async fn create_repository(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreateRepositoryRequest>,
) -> ApiResult<(StatusCode, Json<RepositoryResponse>)> {
    Validator::new()
        .optional_length("description", req.description.as_deref(), 0, 1_000)
        .finish()?;
    let repo = ctx.issues_repo();
    let uc = Repositories {
        repo: repo.as_ref(),
    };
    let created = uc
        .create(auth.id, &req.name, req.description.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(get, path = "/api/v1/issues/repositories", tag = "Issues", responses(
    (status = 200, body = [RepositoryResponse])
))]
pub async fn list_repositories(
    State(ctx): State<AppContext>,
    auth: AuthUser,
) -> ApiResult<Json<Vec<RepositoryResponse>>> {
    let repo = ctx.issues_repo();
    let uc = Repositories {
        repo: repo.as_ref(),
    };
    let items = uc.list_mine(auth.id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(get, path = "/api/v1/issues/repositories/{repo_id}", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id")),
    responses((status = 200, body = RepositoryResponse), (status = 404, body = ErrorBody)))]
pub async fn get_repository(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path(repo_id): Path<Uuid>,
) -> ApiResult<Json<RepositoryResponse>> {
    let repo = ctx.issues_repo();
    let uc = Repositories {
        repo: repo.as_ref(),
    };
    Ok(Json(uc.get(repo_id).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/labels", tag = "Issues", request_body = CreateLabelRequest,
    params(("repo_id" = Uuid, Path, description = "Repository id")),
    responses((status = 201, body = LabelResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn create_label(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(repo_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateLabelRequest>,
) -> ApiResult<(StatusCode, Json<LabelResponse>)> {
    Validator::new().length("name", &req.name, 1, 50).finish()?;
    let repo = ctx.issues_repo();
    let uc = Repositories {
        repo: repo.as_ref(),
    };
    let label = uc
        .create_label(auth.id, repo_id, &req.name, &req.color)
        .await?;
    Ok((StatusCode::CREATED, Json(label.into())))
}

#[utoipa::path(get, path = "/api/v1/issues/repositories/{repo_id}/labels", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id")),
    responses((status = 200, body = [LabelResponse]), (status = 404, body = ErrorBody)))]
pub async fn list_labels(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path(repo_id): Path<Uuid>,
) -> ApiResult<Json<Vec<LabelResponse>>> {
    let repo = ctx.issues_repo();
    let uc = Repositories {
        repo: repo.as_ref(),
    };
    let items = uc.labels(repo_id).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(delete, path = "/api/v1/issues/repositories/{repo_id}/labels/{label_id}", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("label_id" = Uuid, Path, description = "Label id")),
    responses((status = 204), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn delete_label(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, label_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    let repo = ctx.issues_repo();
    let uc = Repositories {
        repo: repo.as_ref(),
    };
    uc.delete_label(auth.id, repo_id, label_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Issues ---

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/issues", tag = "Issues", request_body = CreateIssueRequest,
    params(("repo_id" = Uuid, Path, description = "Repository id")),
    responses((status = 201, body = IssueResponse), (status = 404, body = ErrorBody), (status = 422, body = ErrorBody)))]
pub async fn open_issue(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(repo_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateIssueRequest>,
) -> ApiResult<(StatusCode, Json<IssueResponse>)> {
    check_issue_text(Some(&req.title), Some(&req.body))?;
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let draft = IssueDraft {
        title: req.title,
        body: req.body,
        assignee_id: req.assignee_id,
        label_ids: req.label_ids,
    };
    let issue = uc.open(auth.id, repo_id, draft).await?;
    Ok((StatusCode::CREATED, Json(issue.into())))
}

#[utoipa::path(get, path = "/api/v1/issues/repositories/{repo_id}/issues", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ListIssuesQuery),
    responses((status = 200, body = IssuePage), (status = 404, body = ErrorBody)))]
pub async fn list_issues(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path(repo_id): Path<Uuid>,
    Query(q): Query<ListIssuesQuery>,
) -> ApiResult<Json<Page<IssueResponse>>> {
    let state = q
        .state
        .as_deref()
        .map(str::parse::<IssueState>)
        .transpose()?;
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let filter = IssueFilter {
        state,
        label: q.label,
    };
    let page = uc.list(repo_id, filter, paged(q.page, q.limit)).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(get, path = "/api/v1/issues/repositories/{repo_id}/issues/{number}", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Issue number")),
    responses((status = 200, body = IssueDetailResponse), (status = 404, body = ErrorBody)))]
pub async fn get_issue(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
) -> ApiResult<Json<IssueDetailResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    Ok(Json(uc.get(repo_id, number).await?.into()))
}

#[utoipa::path(patch, path = "/api/v1/issues/repositories/{repo_id}/issues/{number}", tag = "Issues", request_body = EditIssueRequest,
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Issue number")),
    responses((status = 200, body = IssueResponse), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn edit_issue(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
    ApiJson(req): ApiJson<EditIssueRequest>,
) -> ApiResult<Json<IssueResponse>> {
    check_issue_text(req.title.as_deref(), req.body.as_deref())?;
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let issue = uc
        .edit(
            auth.id,
            repo_id,
            number,
            req.title.as_deref(),
            req.body.as_deref(),
        )
        .await?;
    Ok(Json(issue.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/issues/{number}/close", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Issue number")),
    responses((status = 200, body = IssueResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn close_issue(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
) -> ApiResult<Json<IssueResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    Ok(Json(uc.close(auth.id, repo_id, number).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/issues/{number}/reopen", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Issue number")),
    responses((status = 200, body = IssueResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn reopen_issue(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
) -> ApiResult<Json<IssueResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    Ok(Json(uc.reopen(auth.id, repo_id, number).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/issues/{number}/assignee", tag = "Issues", request_body = AssignRequest,
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Issue number")),
    responses((status = 200, body = IssueResponse), (status = 403, body = ErrorBody), (status = 422, body = ErrorBody)))]
pub async fn assign_issue(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
    ApiJson(req): ApiJson<AssignRequest>,
) -> ApiResult<Json<IssueResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let issue = uc
        .assign(auth.id, repo_id, number, req.assignee_id.flatten())
        .await?;
    Ok(Json(issue.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/issues/{number}/labels", tag = "Issues", request_body = LabelRefRequest,
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Issue number")),
    responses((status = 200, body = IssueResponse), (status = 409, body = ErrorBody), (status = 422, body = ErrorBody)))]
pub async fn add_issue_label(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
    ApiJson(req): ApiJson<LabelRefRequest>,
) -> ApiResult<Json<IssueResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let issue = uc.add_label(auth.id, repo_id, number, req.label_id).await?;
    Ok(Json(issue.into()))
}

#[utoipa::path(delete, path = "/api/v1/issues/repositories/{repo_id}/issues/{number}/labels/{label_id}", tag = "Issues",
    params(
        ("repo_id" = Uuid, Path, description = "Repository id"),
        ("number" = i64, Path, description = "Issue number"),
        ("label_id" = Uuid, Path, description = "Label id")
    ),
    responses((status = 200, body = IssueResponse), (status = 404, body = ErrorBody)))]
pub async fn remove_issue_label(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number, label_id)): Path<(Uuid, i64, Uuid)>,
) -> ApiResult<Json<IssueResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let issue = uc.remove_label(auth.id, repo_id, number, label_id).await?;
    Ok(Json(issue.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/issues/{number}/comments", tag = "Issues", request_body = CommentRequest,
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Issue number")),
    responses((status = 201, body = IssueCommentResponse), (status = 404, body = ErrorBody)))]
pub async fn comment_issue(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<IssueCommentResponse>)> {
    Validator::new().length("body", &req.body, 1, 65_536).finish()?;
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = IssueTracker {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let comment = uc.comment(auth.id, repo_id, number, &req.body).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

// --- Pull requests ---

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/pulls", tag = "Issues", request_body = OpenPullRequestRequest,
    params(("repo_id" = Uuid, Path, description = "Repository id")),
    responses((status = 201, body = PullRequestResponse), (status = 400, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn open_pull_request(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(repo_id): Path<Uuid>,
    ApiJson(req): ApiJson<OpenPullRequestRequest>,
) -> ApiResult<(StatusCode, Json<PullRequestResponse>)> {
    check_issue_text(Some(&req.title), Some(&req.body))?;
    Validator::new()
        .length("head", &req.head, 1, 255)
        .length("base", &req.base, 1, 255)
        .finish()?;
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = PullRequests {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let draft = PullRequestDraft {
        title: req.title,
        body: req.body,
        head: req.head,
        base: req.base,
    };
    let pr = uc.open(auth.id, repo_id, draft).await?;
    Ok((StatusCode::CREATED, Json(pr.into())))
}

#[utoipa::path(get, path = "/api/v1/issues/repositories/{repo_id}/pulls", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ListPullRequestsQuery),
    responses((status = 200, body = PullRequestPage), (status = 404, body = ErrorBody)))]
pub async fn list_pull_requests(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path(repo_id): Path<Uuid>,
    Query(q): Query<ListPullRequestsQuery>,
) -> ApiResult<Json<Page<PullRequestResponse>>> {
    let state = q
        .state
        .as_deref()
        .map(str::parse::<PullRequestState>)
        .transpose()?;
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = PullRequests {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    let page = uc.list(repo_id, state, paged(q.page, q.limit)).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(get, path = "/api/v1/issues/repositories/{repo_id}/pulls/{number}", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Pull request number")),
    responses((status = 200, body = PullRequestDetailResponse), (status = 404, body = ErrorBody)))]
pub async fn get_pull_request(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
) -> ApiResult<Json<PullRequestDetailResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = PullRequests {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    Ok(Json(uc.get(repo_id, number).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/pulls/{number}/merge", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Pull request number")),
    responses((status = 200, body = PullRequestResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn merge_pull_request(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
) -> ApiResult<Json<PullRequestResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = PullRequests {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    Ok(Json(uc.merge(auth.id, repo_id, number).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/pulls/{number}/close", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Pull request number")),
    responses((status = 200, body = PullRequestResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn close_pull_request(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
) -> ApiResult<Json<PullRequestResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = PullRequests {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    Ok(Json(uc.close(auth.id, repo_id, number).await?.into()))
}

#[utoipa::path(post, path = "/api/v1/issues/repositories/{repo_id}/pulls/{number}/reopen", tag = "Issues",
    params(("repo_id" = Uuid, Path, description = "Repository id"), ("number" = i64, Path, description = "Pull request number")),
    responses((status = 200, body = PullRequestResponse), (status = 403, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn reopen_pull_request(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path((repo_id, number)): Path<(Uuid, i64)>,
) -> ApiResult<Json<PullRequestResponse>> {
    let repo = ctx.issues_repo();
    let counters = ctx.counter_repo();
    let users = ctx.user_repo();
    let uc = PullRequests {
        repo: repo.as_ref(),
        counters: counters.as_ref(),
        users: users.as_ref(),
    };
    Ok(Json(uc.reopen(auth.id, repo_id, number).await?.into()))
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::presentation::http::testing::{TestApp, error_fields, send};

    async fn repository(app: &Router, token: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/repositories",
            token,
            Some(json!({"name": "core"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn repository_names_are_unique_and_labels_belong_to_the_owner() {
        let t = TestApp::new(&["ann", "bob"]);
        let app = routes(t.ctx.clone());

        let (status, _) = send(
            &app,
            "POST",
            "/repositories",
            &t.token(0),
            Some(json!({"name": "bad name!"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let id = repository(&app, &t.token(0)).await;
        let (status, _) = send(
            &app,
            "POST",
            "/repositories",
            &t.token(0),
            Some(json!({"name": "core"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let labels = format!("/repositories/{id}/labels");
        let bug = json!({"name": "bug", "color": "D73A4A"});
        let (status, _) = send(&app, "POST", &labels, &t.token(1), Some(bug.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, "POST", &labels, &t.token(0), Some(json!({"name": "bug", "color": "red"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, body) = send(&app, "POST", &labels, &t.token(0), Some(bug)).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["color"], "#d73a4a");
    }

    #[tokio::test]
    async fn issues_are_numbered_and_guarded() {
        let t = TestApp::new(&["ann", "bob", "cy"]);
        let app = routes(t.ctx.clone());
        let id = repository(&app, &t.token(0)).await;
        let issues = format!("/repositories/{id}/issues");

        let (status, body) = send(&app, "POST", &issues, &t.token(1), Some(json!({"title": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_fields(&body), vec!["title"]);

        let unknown_label = json!({"title": "crash", "label_ids": [Uuid::new_v4()]});
        let (status, _) = send(&app, "POST", &issues, &t.token(1), Some(unknown_label)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, issue) = send(&app, "POST", &issues, &t.token(1), Some(json!({"title": " crash "}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(issue["number"], 1);
        assert_eq!(issue["title"], "crash");
        assert_eq!(issue["state"], "open");

        let close = format!("{issues}/1/close");
        let (status, _) = send(&app, "POST", &close, &t.token(2), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, closed) = send(&app, "POST", &close, &t.token(0), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(closed["state"], "closed");
        let (status, _) = send(&app, "POST", &close, &t.token(1), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, "GET", &format!("{issues}/99"), &t.token(1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn only_the_owner_merges_pull_requests() {
        let t = TestApp::new(&["ann", "bob"]);
        let app = routes(t.ctx.clone());
        let id = repository(&app, &t.token(0)).await;
        let pulls = format!("/repositories/{id}/pulls");
        let pr = |head: &str| -> Value { json!({"title": "feature", "head": head, "base": "main"}) };

        let (status, _) = send(&app, "POST", &pulls, &t.token(1), Some(pr("main"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, opened) = send(&app, "POST", &pulls, &t.token(1), Some(pr("feature"))).await;
        assert_eq!(status, StatusCode::CREATED);
        let merge = format!("{pulls}/{}/merge", opened["number"]);

        let (status, _) = send(&app, "POST", &merge, &t.token(1), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, merged) = send(&app, "POST", &merge, &t.token(0), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(merged["state"], "merged");
    }
}

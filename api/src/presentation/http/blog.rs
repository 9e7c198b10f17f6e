use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::ports::blog_repository::{PostFilter, PostPatch};
use crate::application::use_cases::blog::comments::Comments;
use crate::application::use_cases::blog::posts::{PostDetail, Posts};
use crate::application::use_cases::blog::social::Social;
use crate::application::validation::Validator;
use crate::bootstrap::app_context::AppContext;
use crate::domain::blog::post::{Comment, CommentThread, Post};
use crate::domain::blog::social::Suggestion;
use crate::presentation::http::auth::AuthUser;
use crate::presentation::http::error::{ApiJson, ApiResult, ErrorBody};
use crate::presentation::http::{
    Page, PageParams, PostPage, SuggestionPage, UserPage, UserRef, paged,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct PostResponse {
    pub id: Uuid,
    pub author: UserRef,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<Post> for PostResponse {
    fn from(p: Post) -> Self {
        Self {
            id: p.id,
            author: p.author.into(),
            title: p.title,
            body: p.body,
            tags: p.tags,
            like_count: p.like_count,
            comment_count: p.comment_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: UserRef,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(c: Comment) -> Self {
        Self {
            id: c.id,
            post_id: c.post_id,
            author: c.author.into(),
            parent_id: c.parent_id,
            body: c.body,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentThreadResponse {
    #[serde(flatten)]
    pub comment: CommentResponse,
    pub replies: Vec<CommentResponse>,
}

impl From<CommentThread> for CommentThreadResponse {
    fn from(t: CommentThread) -> Self {
        Self {
            comment: t.comment.into(),
            replies: t.replies.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostDetailResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub comments: Vec<CommentThreadResponse>,
}

impl From<PostDetail> for PostDetailResponse {
    fn from(d: PostDetail) -> Self {
        Self {
            post: d.post.into(),
            comments: d.comments.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub liked: bool,
    pub like_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuggestionResponse {
    pub user: UserRef,
    pub mutual_count: i64,
}

impl From<Suggestion> for SuggestionResponse {
    fn from(s: Suggestion) -> Self {
        Self {
            user: s.user.into(),
            mutual_count: s.mutual_count,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    pub body: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Author user id
    pub author: Option<Uuid>,
    pub tag: Option<String>,
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/posts", post(create_post).get(list_posts))
        .route(
            "/posts/:id",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/posts/:id/like", post(toggle_like))
        .route("/posts/:id/comments", post(add_comment))
        .route("/comments/:id/replies", post(reply))
        .route("/comments/:id", delete(delete_comment))
        .route("/users/:id/follow", post(follow).delete(unfollow))
        .route("/users/:id/followers", get(followers))
        .route("/users/:id/following", get(following))
        .route("/suggestions", get(suggestions))
        .route("/feed", get(feed))
        .with_state(ctx)
}

fn check_post(title: Option<&str>, body: Option<&str>) -> ApiResult<()> {
    Validator::new()
        .optional_length("title", title, 1, 200)
        .optional_length("body", body, 1, 20_000)
        .finish()?;
    Ok(())
}

fn check_comment(body: &str) -> ApiResult<()> {
    Validator::new().length("body", body, 1, 5_000).finish()?;
    Ok(())
}

#[utoipa::path(post, path = "/api/v1/blog/posts", tag = "Blog", request_body = CreatePostRequest, responses(
    (status = 201, body = PostResponse),
    (status = 400, body = ErrorBody)
))]
pub async fn create_post(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    ApiJson(req): ApiJson<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    check_post(Some(&req.title), Some(&req.body))?;
    let repo = ctx.blog_repo();
    let uc = Posts {
        repo: repo.as_ref(),
    };
    let post = uc.create(auth.id, &req.title, &req.body, &req.tags).await?;
    Ok((StatusCode::CREATED, Json(post.into())))
}

#[utoipa::path(get, path = "/api/v1/blog/posts", tag = "Blog", params(ListPostsQuery), responses(
    (status = 200, body = PostPage)
))]
pub async fn list_posts(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Query(q): Query<ListPostsQuery>,
) -> ApiResult<Json<Page<PostResponse>>> {
    let repo = ctx.blog_repo();
    let uc = Posts {
        repo: repo.as_ref(),
    };
    let filter = PostFilter {
        author_id: q.author,
        tag: q.tag,
    };
    let page = uc.list(filter, paged(q.page, q.limit)).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(get, path = "/api/v1/blog/posts/{id}", tag = "Blog",
    params(("id" = Uuid, Path, description = "Post id")),
    responses((status = 200, body = PostDetailResponse), (status = 404, body = ErrorBody)))]
pub async fn get_post(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PostDetailResponse>> {
    let repo = ctx.blog_repo();
    let uc = Posts {
        repo: repo.as_ref(),
    };
    Ok(Json(uc.get(id).await?.into()))
}

#[utoipa::path(patch, path = "/api/v1/blog/posts/{id}", tag = "Blog", request_body = UpdatePostRequest,
    params(("id" = Uuid, Path, description = "Post id")),
    responses((status = 200, body = PostResponse), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn update_post(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdatePostRequest>,
) -> ApiResult<Json<PostResponse>> {
    check_post(req.title.as_deref(), req.body.as_deref())?;
    let repo = ctx.blog_repo();
    let uc = Posts {
        repo: repo.as_ref(),
    };
    let patch = PostPatch {
        title: req.title,
        body: req.body,
        tags: req.tags,
    };
    Ok(Json(uc.update(auth.id, id, patch).await?.into()))
}

#[utoipa::path(delete, path = "/api/v1/blog/posts/{id}", tag = "Blog",
    params(("id" = Uuid, Path, description = "Post id")),
    responses((status = 204), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn delete_post(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = ctx.blog_repo();
    let uc = Posts {
        repo: repo.as_ref(),
    };
    uc.delete(auth.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/v1/blog/posts/{id}/like", tag = "Blog",
    params(("id" = Uuid, Path, description = "Post id")),
    responses((status = 200, body = LikeResponse), (status = 404, body = ErrorBody)))]
pub async fn toggle_like(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LikeResponse>> {
    let repo = ctx.blog_repo();
    let uc = Posts {
        repo: repo.as_ref(),
    };
    let (liked, like_count) = uc.toggle_like(auth.id, id).await?;
    Ok(Json(LikeResponse { liked, like_count }))
}

#[utoipa::path(post, path = "/api/v1/blog/posts/{id}/comments", tag = "Blog", request_body = CommentRequest,
    params(("id" = Uuid, Path, description = "Post id")),
    responses((status = 201, body = CommentResponse), (status = 404, body = ErrorBody)))]
pub async fn add_comment(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    check_comment(&req.body)?;
    let repo = ctx.blog_repo();
    let uc = Comments {
        repo: repo.as_ref(),
    };
    let comment = uc.comment(auth.id, id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

#[utoipa::path(post, path = "/api/v1/blog/comments/{id}/replies", tag = "Blog", request_body = CommentRequest,
    params(("id" = Uuid, Path, description = "Comment id")),
    responses((status = 201, body = CommentResponse), (status = 404, body = ErrorBody)))]
pub async fn reply(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    check_comment(&req.body)?;
    let repo = ctx.blog_repo();
    let uc = Comments {
        repo: repo.as_ref(),
    };
    let comment = uc.reply(auth.id, id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

#[utoipa::path(delete, path = "/api/v1/blog/comments/{id}", tag = "Blog",
    params(("id" = Uuid, Path, description = "Comment id")),
    responses((status = 204), (status = 403, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn delete_comment(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let repo = ctx.blog_repo();
    let uc = Comments {
        repo: repo.as_ref(),
    };
    uc.delete(auth.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/v1/blog/users/{id}/follow", tag = "Blog",
    params(("id" = Uuid, Path, description = "User to follow")),
    responses((status = 204), (status = 400, body = ErrorBody), (status = 404, body = ErrorBody), (status = 409, body = ErrorBody)))]
pub async fn follow(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let blog = ctx.blog_repo();
    let users = ctx.user_repo();
    let uc = Social {
        blog: blog.as_ref(),
        users: users.as_ref(),
    };
    uc.follow(auth.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(delete, path = "/api/v1/blog/users/{id}/follow", tag = "Blog",
    params(("id" = Uuid, Path, description = "User to unfollow")),
    responses((status = 204), (status = 400, body = ErrorBody), (status = 404, body = ErrorBody)))]
pub async fn unfollow(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let blog = ctx.blog_repo();
    let users = ctx.user_repo();
    let uc = Social {
        blog: blog.as_ref(),
        users: users.as_ref(),
    };
    uc.unfollow(auth.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/api/v1/blog/users/{id}/followers", tag = "Blog",
    params(("id" = Uuid, Path, description = "User id"), PageParams),
    responses((status = 200, body = UserPage), (status = 404, body = ErrorBody)))]
pub async fn followers(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<PageParams>,
) -> ApiResult<Json<Page<UserRef>>> {
    let blog = ctx.blog_repo();
    let users = ctx.user_repo();
    let uc = Social {
        blog: blog.as_ref(),
        users: users.as_ref(),
    };
    let page = uc.followers(id, q.into()).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(get, path = "/api/v1/blog/users/{id}/following", tag = "Blog",
    params(("id" = Uuid, Path, description = "User id"), PageParams),
    responses((status = 200, body = UserPage), (status = 404, body = ErrorBody)))]
pub async fn following(
    State(ctx): State<AppContext>,
    _auth: AuthUser,
    Path(id): Path<Uuid>,
    Query(q): Query<PageParams>,
) -> ApiResult<Json<Page<UserRef>>> {
    let blog = ctx.blog_repo();
    let users = ctx.user_repo();
    let uc = Social {
        blog: blog.as_ref(),
        users: users.as_ref(),
    };
    let page = uc.following(id, q.into()).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(get, path = "/api/v1/blog/suggestions", tag = "Blog", params(PageParams), responses(
    (status = 200, body = SuggestionPage)
))]
pub async fn suggestions(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(q): Query<PageParams>,
) -> ApiResult<Json<Page<SuggestionResponse>>> {
    let blog = ctx.blog_repo();
    let users = ctx.user_repo();
    let uc = Social {
        blog: blog.as_ref(),
        users: users.as_ref(),
    };
    let page = uc.suggestions(auth.id, q.into()).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

#[utoipa::path(get, path = "/api/v1/blog/feed", tag = "Blog", params(PageParams), responses(
    (status = 200, body = PostPage)
))]
pub async fn feed(
    State(ctx): State<AppContext>,
    auth: AuthUser,
    Query(q): Query<PageParams>,
) -> ApiResult<Json<Page<PostResponse>>> {
    let blog = ctx.blog_repo();
    let users = ctx.user_repo();
    let uc = Social {
        blog: blog.as_ref(),
        users: users.as_ref(),
    };
    let page = uc.feed(auth.id, q.into()).await?;
    Ok(Json(Page::from_paginated(page, Into::into)))
}

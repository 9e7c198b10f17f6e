use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::MatchedPath;
use dotenvy::dotenv;
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crudsuite::bootstrap::app_context::{AppContext, AppServices};
use crudsuite::bootstrap::config::{Config, SubApp};
use crudsuite::infrastructure::db;
use crudsuite::infrastructure::db::repositories::{
    bank_repository_sqlx::SqlxBankRepository, blog_repository_sqlx::SqlxBlogRepository,
    counter_repository_sqlx::SqlxCounterRepository, issues_repository_sqlx::SqlxIssuesRepository,
    project_repository_sqlx::SqlxProjectRepository, store_repository_sqlx::SqlxStoreRepository,
    todo_repository_sqlx::SqlxTodoRepository, user_repository_sqlx::SqlxUserRepository,
};
use crudsuite::presentation::http as api;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            api::health::health,
            api::auth::register,
            api::auth::login,
            api::auth::logout,
            api::auth::me,
            api::bank::open_account,
            api::bank::list_accounts,
            api::bank::get_account,
            api::bank::deposit,
            api::bank::withdraw,
            api::bank::list_transactions,
            api::bank::transfer,
            api::blog::create_post,
            api::blog::list_posts,
            api::blog::get_post,
            api::blog::update_post,
            api::blog::delete_post,
            api::blog::toggle_like,
            api::blog::add_comment,
            api::blog::reply,
            api::blog::delete_comment,
            api::blog::follow,
            api::blog::unfollow,
            api::blog::followers,
            api::blog::following,
            api::blog::suggestions,
            api::blog::feed,
            api::store::list_products,
            api::store::create_product,
            api::store::get_product,
            api::store::update_product,
            api::store::delete_product,
            api::store::rate_product,
            api::store::departments,
            api::store::get_cart,
            api::store::add_to_cart,
            api::store::remove_from_cart,
            api::store::clear_cart,
            api::store::checkout,
            api::store::list_orders,
            api::store::get_order,
            api::store::set_order_status,
            api::store::cancel_order,
            api::issues::create_repository,
            api::issues::list_repositories,
            api::issues::get_repository,
            api::issues::create_label,
            api::issues::list_labels,
            api::issues::delete_label,
            api::issues::open_issue,
            api::issues::list_issues,
            api::issues::get_issue,
            api::issues::edit_issue,
            api::issues::close_issue,
            api::issues::reopen_issue,
            api::issues::assign_issue,
            api::issues::add_issue_label,
            api::issues::remove_issue_label,
            api::issues::comment_issue,
            api::issues::open_pull_request,
            api::issues::list_pull_requests,
            api::issues::get_pull_request,
            api::issues::merge_pull_request,
            api::issues::close_pull_request,
            api::issues::reopen_pull_request,
            api::projects::create_project,
            api::projects::list_projects,
            api::projects::get_project,
            api::projects::list_members,
            api::projects::remove_member,
            api::projects::request_to_join,
            api::projects::list_join_requests,
            api::projects::approve_join_request,
            api::projects::reject_join_request,
            api::projects::create_sprint,
            api::projects::list_sprints,
            api::projects::start_sprint,
            api::projects::complete_sprint,
            api::projects::create_task,
            api::projects::list_tasks,
            api::projects::get_task,
            api::projects::update_task,
            api::projects::assign_task,
            api::projects::delete_task,
            api::todo::create_todo,
            api::todo::list_todos,
            api::todo::get_todo,
            api::todo::update_todo,
            api::todo::toggle_todo,
            api::todo::delete_todo,
        ),
        components(schemas(
            api::error::ErrorBody,
            api::error::FieldErrorItem,
            api::UserRef,
            api::UserPage,
            api::TransactionPage,
            api::PostPage,
            api::SuggestionPage,
            api::ProductPage,
            api::OrderPage,
            api::IssuePage,
            api::PullRequestPage,
            api::TodoPage,
            api::health::HealthResp,
            api::auth::RegisterRequest,
            api::auth::LoginRequest,
            api::auth::LoginResponse,
            api::auth::UserResponse,
            api::bank::AccountResponse,
            api::bank::TransactionResponse,
            api::bank::OpenAccountRequest,
            api::bank::AmountRequest,
            api::bank::TransferBody,
            api::blog::PostResponse,
            api::blog::CommentResponse,
            api::blog::CommentThreadResponse,
            api::blog::PostDetailResponse,
            api::blog::LikeResponse,
            api::blog::SuggestionResponse,
            api::blog::CreatePostRequest,
            api::blog::UpdatePostRequest,
            api::blog::CommentRequest,
            api::store::ProductResponse,
            api::store::DepartmentResponse,
            api::store::LineResponse,
            api::store::CartResponse,
            api::store::OrderResponse,
            api::store::CreateProductRequest,
            api::store::UpdateProductRequest,
            api::store::RateRequest,
            api::store::AddToCartRequest,
            api::store::SetStatusRequest,
            api::issues::RepositoryResponse,
            api::issues::LabelResponse,
            api::issues::IssueResponse,
            api::issues::IssueCommentResponse,
            api::issues::TimelineEventResponse,
            api::issues::IssueDetailResponse,
            api::issues::PullRequestResponse,
            api::issues::PullRequestDetailResponse,
            api::issues::CreateRepositoryRequest,
            api::issues::CreateLabelRequest,
            api::issues::CreateIssueRequest,
            api::issues::EditIssueRequest,
            api::issues::AssignRequest,
            api::issues::LabelRefRequest,
            api::issues::CommentRequest,
            api::issues::OpenPullRequestRequest,
            api::projects::ProjectResponse,
            api::projects::MemberResponse,
            api::projects::JoinRequestResponse,
            api::projects::SprintResponse,
            api::projects::SprintCompletionResponse,
            api::projects::TaskResponse,
            api::projects::CreateProjectRequest,
            api::projects::JoinProjectRequest,
            api::projects::CreateSprintRequest,
            api::projects::CreateTaskRequest,
            api::projects::UpdateTaskRequest,
            api::projects::AssignTaskRequest,
            api::todo::TodoResponse,
            api::todo::CreateTodoRequest,
            api::todo::UpdateTodoRequest,
        )),
        tags(
            (name = "Auth", description = "Registration, login and sessions"),
            (name = "Bank", description = "Accounts, deposits, withdrawals and transfers"),
            (name = "Blog", description = "Posts, comments, likes and follows"),
            (name = "Store", description = "Catalog, cart and orders"),
            (name = "Issues", description = "Repositories, issues and pull requests"),
            (name = "Projects", description = "Projects, sprints and tasks"),
            (name = "Todo", description = "Personal task list"),
            (name = "Health", description = "System health checks")
        )
    )]
struct ApiDoc;

fn build_cors(cfg: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::PATCH,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);
    match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(origin).allow_credentials(true),
        Some(Err(_)) | None if cfg.is_production => base.allow_origin(AllowOrigin::exact(
            HeaderValue::from_static("http://invalid"),
        )),
        _ => base
            .allow_origin(AllowOrigin::mirror_request())
            .allow_credentials(true),
    }
}

fn sub_app_routes(app: SubApp, ctx: AppContext) -> Router {
    match app {
        SubApp::Bank => api::bank::routes(ctx),
        SubApp::Blog => api::blog::routes(ctx),
        SubApp::Store => api::store::routes(ctx),
        SubApp::Issues => api::issues::routes(ctx),
        SubApp::Projects => api::projects::routes(ctx),
        SubApp::Todo => api::todo::routes(ctx),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = ?e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crudsuite=debug,tower_http=info,axum=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting crudsuite backend");

    // Database
    let pool = db::connect_pool(&cfg.database_url, cfg.db_max_connections).await?;
    db::migrate(&pool).await?;

    let services = AppServices::new(
        Arc::new(SqlxUserRepository::new(pool.clone())),
        Arc::new(SqlxCounterRepository::new(pool.clone())),
        Arc::new(SqlxBankRepository::new(pool.clone())),
        Arc::new(SqlxBlogRepository::new(pool.clone())),
        Arc::new(SqlxStoreRepository::new(pool.clone())),
        Arc::new(SqlxIssuesRepository::new(pool.clone())),
        Arc::new(SqlxProjectRepository::new(pool.clone())),
        Arc::new(SqlxTodoRepository::new(pool.clone())),
    );
    let ctx = AppContext::new(cfg.clone(), services);

    let mut api_router = Router::new()
        .nest("/api/v1", api::health::routes(pool.clone()))
        .nest("/api/v1/auth", api::auth::routes(ctx.clone()));
    for app in SubApp::ALL {
        if cfg.is_enabled(app) {
            info!(app = %app, "sub_app_enabled");
            api_router = api_router.nest(
                &format!("/api/v1/{}", app.as_str()),
                sub_app_routes(app, ctx.clone()),
            );
        }
    }

    let app = api_router
        .merge(SwaggerUi::new("/api/v1/docs").url("/api/v1/openapi.json", ApiDoc::openapi()))
        .layer(build_cors(&cfg))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

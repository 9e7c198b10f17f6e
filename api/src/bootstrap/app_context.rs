use std::sync::Arc;

use axum::extract::FromRef;

use crate::application::ports::bank_repository::BankRepository;
use crate::application::ports::blog_repository::BlogRepository;
use crate::application::ports::counter_repository::CounterRepository;
use crate::application::ports::issues_repository::IssuesRepository;
use crate::application::ports::project_repository::ProjectRepository;
use crate::application::ports::store_repository::StoreRepository;
use crate::application::ports::todo_repository::TodoRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::bootstrap::config::Config;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    user_repo: Arc<dyn UserRepository>,
    counter_repo: Arc<dyn CounterRepository>,
    bank_repo: Arc<dyn BankRepository>,
    blog_repo: Arc<dyn BlogRepository>,
    store_repo: Arc<dyn StoreRepository>,
    issues_repo: Arc<dyn IssuesRepository>,
    project_repo: Arc<dyn ProjectRepository>,
    todo_repo: Arc<dyn TodoRepository>,
}

impl AppServices {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        counter_repo: Arc<dyn CounterRepository>,
        bank_repo: Arc<dyn BankRepository>,
        blog_repo: Arc<dyn BlogRepository>,
        store_repo: Arc<dyn StoreRepository>,
        issues_repo: Arc<dyn IssuesRepository>,
        project_repo: Arc<dyn ProjectRepository>,
        todo_repo: Arc<dyn TodoRepository>,
    ) -> Self {
        Self {
            user_repo,
            counter_repo,
            bank_repo,
            blog_repo,
            store_repo,
            issues_repo,
            project_repo,
            todo_repo,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn user_repo(&self) -> Arc<dyn UserRepository> {
        self.services.user_repo.clone()
    }

    pub fn counter_repo(&self) -> Arc<dyn CounterRepository> {
        self.services.counter_repo.clone()
    }

    pub fn bank_repo(&self) -> Arc<dyn BankRepository> {
        self.services.bank_repo.clone()
    }

    pub fn blog_repo(&self) -> Arc<dyn BlogRepository> {
        self.services.blog_repo.clone()
    }

    pub fn store_repo(&self) -> Arc<dyn StoreRepository> {
        self.services.store_repo.clone()
    }

    pub fn issues_repo(&self) -> Arc<dyn IssuesRepository> {
        self.services.issues_repo.clone()
    }

    pub fn project_repo(&self) -> Arc<dyn ProjectRepository> {
        self.services.project_repo.clone()
    }

    pub fn todo_repo(&self) -> Arc<dyn TodoRepository> {
        self.services.todo_repo.clone()
    }
}

impl FromRef<AppContext> for Config {
    fn from_ref(ctx: &AppContext) -> Config {
        ctx.cfg.clone()
    }
}

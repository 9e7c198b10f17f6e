use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::todo::task::{TodoPriority, TodoTask};

#[derive(Debug, Clone)]
pub struct NewTodo {
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TodoPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<(bool, Option<chrono::DateTime<chrono::Utc>>)>,
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn create(&self, todo: &NewTodo) -> anyhow::Result<TodoTask>;
    /// Only returns tasks owned by `owner_id`.
    async fn get(&self, id: Uuid, owner_id: Uuid) -> anyhow::Result<Option<TodoTask>>;
    async fn list(
        &self,
        owner_id: Uuid,
        completed: Option<bool>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<TodoTask>, i64)>;
    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &TodoPatch,
    ) -> anyhow::Result<Option<TodoTask>>;
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool>;
}

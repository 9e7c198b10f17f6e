use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::todo_repository::{NewTodo, TodoPatch, TodoRepository};
use crate::domain::todo::task::TodoTask;
use crate::infrastructure::db::PgPool;

const TODO_COLUMNS: &str = "id, owner_id, title, description, priority, due_date, completed, completed_at, created_at, updated_at";

pub struct SqlxTodoRepository {
    pub pool: PgPool,
}

impl SqlxTodoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_todo(r: &PgRow) -> anyhow::Result<TodoTask> {
    Ok(TodoTask {
        id: r.get("id"),
        owner_id: r.get("owner_id"),
        title: r.get("title"),
        description: r.get("description"),
        priority: r.get::<String, _>("priority").parse()?,
        due_date: r.get("due_date"),
        completed: r.get("completed"),
        completed_at: r.get("completed_at"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    })
}

#[async_trait]
impl TodoRepository for SqlxTodoRepository {
    async fn create(&self, todo: &NewTodo) -> anyhow::Result<TodoTask> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO todo_tasks (owner_id, title, description, priority, due_date)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {TODO_COLUMNS}"#
        ))
        .bind(todo.owner_id)
        .bind(&todo.title)
        .bind(todo.description.as_deref())
        .bind(todo.priority.as_str())
        .bind(todo.due_date)
        .fetch_one(&self.pool)
        .await?;
        map_todo(&row)
    }

    async fn get(&self, id: Uuid, owner_id: Uuid) -> anyhow::Result<Option<TodoTask>> {
        let row = sqlx::query(&format!(
            "SELECT {TODO_COLUMNS} FROM todo_tasks WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_todo).transpose()
    }

    async fn list(
        &self,
        owner_id: Uuid,
        completed: Option<bool>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<TodoTask>, i64)> {
        let rows = sqlx::query(&format!(
            r#"SELECT {TODO_COLUMNS}, COUNT(*) OVER() AS total FROM todo_tasks
               WHERE owner_id = $1 AND ($2::bool IS NULL OR completed = $2)
               ORDER BY created_at DESC, id
               LIMIT $3 OFFSET $4"#
        ))
        .bind(owner_id)
        .bind(completed)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let items = rows.iter().map(map_todo).collect::<anyhow::Result<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: Uuid,
        patch: &TodoPatch,
    ) -> anyhow::Result<Option<TodoTask>> {
        let (set_completed, completed, completed_at) = match patch.completed {
            Some((c, at)) => (true, c, at),
            None => (false, false, None),
        };
        let row = sqlx::query(&format!(
            r#"UPDATE todo_tasks SET
                 title = COALESCE($3, title),
                 description = CASE WHEN $4 THEN $5 ELSE description END,
                 priority = COALESCE($6, priority),
                 due_date = CASE WHEN $7 THEN $8 ELSE due_date END,
                 completed = CASE WHEN $9 THEN $10 ELSE completed END,
                 completed_at = CASE WHEN $9 THEN $11 ELSE completed_at END,
                 updated_at = now()
               WHERE id = $1 AND owner_id = $2
               RETURNING {TODO_COLUMNS}"#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(patch.title.as_deref())
        .bind(patch.description.is_some())
        .bind(patch.description.clone().flatten())
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(patch.due_date.is_some())
        .bind(patch.due_date.flatten())
        .bind(set_completed)
        .bind(completed)
        .bind(completed_at)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_todo).transpose()
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM todo_tasks WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

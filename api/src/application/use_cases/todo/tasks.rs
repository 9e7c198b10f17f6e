use chrono::NaiveDate;
use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::ports::todo_repository::{NewTodo, TodoPatch, TodoRepository};
use crate::domain::todo::task::{TodoPriority, TodoTask};

pub struct TodoTasks<'a, R: TodoRepository + ?Sized> {
    pub repo: &'a R,
}

/// Field changes requested by the caller. `completed` is turned into a
/// completion stamp before it reaches the store.
#[derive(Debug, Clone, Default)]
pub struct TodoChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TodoPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub completed: Option<bool>,
}

impl<'a, R: TodoRepository + ?Sized> TodoTasks<'a, R> {
    pub async fn create(
        &self,
        owner_id: Uuid,
        title: &str,
        description: Option<String>,
        priority: TodoPriority,
        due_date: Option<NaiveDate>,
    ) -> ServiceResult<TodoTask> {
        let task = self
            .repo
            .create(&NewTodo {
                owner_id,
                title: title.trim().to_string(),
                description,
                priority,
                due_date,
            })
            .await?;
        tracing::debug!(task_id = %task.id, "todo_created");
        Ok(task)
    }

    pub async fn list(
        &self,
        owner_id: Uuid,
        completed: Option<bool>,
        page: PageRequest,
    ) -> ServiceResult<Paginated<TodoTask>> {
        let (items, total) = self.repo.list(owner_id, completed, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> ServiceResult<TodoTask> {
        self.repo
            .get(id, owner_id)
            .await?
            .ok_or(ServiceError::NotFound("task"))
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        changes: TodoChanges,
    ) -> ServiceResult<TodoTask> {
        let current = self.get(owner_id, id).await?;
        let completed = match changes.completed {
            Some(c) if c != current.completed => Some(current.toggled(chrono::Utc::now())),
            _ => None,
        };
        let patch = TodoPatch {
            title: changes.title.map(|t| t.trim().to_string()),
            description: changes.description,
            priority: changes.priority,
            due_date: changes.due_date,
            completed,
        };
        self.repo
            .update(id, owner_id, &patch)
            .await?
            .ok_or(ServiceError::NotFound("task"))
    }

    pub async fn toggle(&self, owner_id: Uuid, id: Uuid) -> ServiceResult<TodoTask> {
        let current = self.get(owner_id, id).await?;
        let patch = TodoPatch {
            completed: Some(current.toggled(chrono::Utc::now())),
            ..Default::default()
        };
        self.repo
            .update(id, owner_id, &patch)
            .await?
            .ok_or(ServiceError::NotFound("task"))
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> ServiceResult<()> {
        if !self.repo.delete(id, owner_id).await? {
            return Err(ServiceError::NotFound("task"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::todo::fake::MemTodos;

    #[tokio::test]
    async fn toggle_stamps_and_clears_completion() {
        let repo = MemTodos::default();
        let todos = TodoTasks { repo: &repo };
        let me = Uuid::new_v4();
        let t = todos
            .create(me, " write tests ", None, TodoPriority::High, None)
            .await
            .unwrap();
        assert_eq!(t.title, "write tests");
        let done = todos.toggle(me, t.id).await.unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());
        let undone = todos.toggle(me, t.id).await.unwrap();
        assert!(!undone.completed);
        assert!(undone.completed_at.is_none());
    }

    #[tokio::test]
    async fn setting_completed_to_current_value_keeps_stamp() {
        let repo = MemTodos::default();
        let todos = TodoTasks { repo: &repo };
        let me = Uuid::new_v4();
        let t = todos.create(me, "a", None, TodoPriority::Low, None).await.unwrap();
        let done = todos.toggle(me, t.id).await.unwrap();
        let again = todos
            .update(
                me,
                t.id,
                TodoChanges {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(again.completed_at, done.completed_at);
        assert_eq!(todos.list(me, Some(true), PageRequest::default()).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn other_users_tasks_are_invisible() {
        let repo = MemTodos::default();
        let todos = TodoTasks { repo: &repo };
        let me = Uuid::new_v4();
        let t = todos.create(me, "a", None, TodoPriority::Low, None).await.unwrap();
        let stranger = Uuid::new_v4();
        assert!(matches!(
            todos.toggle(stranger, t.id).await,
            Err(ServiceError::NotFound("task"))
        ));
        assert!(matches!(
            todos.delete(stranger, t.id).await,
            Err(ServiceError::NotFound("task"))
        ));
        todos.delete(me, t.id).await.unwrap();
    }
}

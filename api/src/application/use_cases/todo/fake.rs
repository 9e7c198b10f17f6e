use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::todo_repository::{NewTodo, TodoPatch, TodoRepository};
use crate::domain::todo::task::TodoTask;

#[derive(Default)]
pub struct MemTodos(Mutex<Vec<TodoTask>>);

#[async_trait]
impl TodoRepository for MemTodos {
    async fn create(&self, n: &NewTodo) -> anyhow::Result<TodoTask> {
        let t = TodoTask {
            id: Uuid::new_v4(),
            owner_id: n.owner_id,
            title: n.title.clone(),
            description: n.description.clone(),
            priority: n.priority,
            due_date: n.due_date,
            completed: false,
            completed_at: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        self.0.lock().unwrap().push(t.clone());
        Ok(t)
    }
    async fn get(&self, id: Uuid, owner: Uuid) -> anyhow::Result<Option<TodoTask>> {
        Ok(self
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id && t.owner_id == owner)
            .cloned())
    }
    async fn list(&self, owner: Uuid, completed: Option<bool>, _: PageRequest) -> anyhow::Result<(Vec<TodoTask>, i64)> {
        let items: Vec<_> = self
            .0
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.owner_id == owner && completed.map_or(true, |c| c == t.completed))
            .cloned()
            .collect();
        let total = items.len() as i64;
        Ok((items, total))
    }
    async fn update(&self, id: Uuid, owner: Uuid, patch: &TodoPatch) -> anyhow::Result<Option<TodoTask>> {
        let mut all = self.0.lock().unwrap();
        Ok(all
            .iter_mut()
            .find(|t| t.id == id && t.owner_id == owner)
            .map(|t| {
                if let Some(title) = &patch.title {
                    t.title = title.clone();
                }
                if let Some((done, at)) = patch.completed {
                    t.completed = done;
                    t.completed_at = at;
                }
                t.clone()
            }))
    }
    async fn delete(&self, id: Uuid, owner: Uuid) -> anyhow::Result<bool> {
        let mut all = self.0.lock().unwrap();
        let before = all.len();
        all.retain(|t| !(t.id == id && t.owner_id == owner));
        Ok(all.len() != before)
    }
}

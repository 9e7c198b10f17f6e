use uuid::Uuid;

use super::membership;
use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::counter_repository::CounterRepository;
use crate::application::ports::project_repository::{
    NewTask, ProjectRepository, TaskFilter, TaskPatch,
};
use crate::domain::projects::project::MemberRole;
use crate::domain::projects::task::{Priority, Task};
use crate::domain::sequence;

pub struct Tasks<'a, R, C>
where
    R: ProjectRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    pub repo: &'a R,
    pub counters: &'a C,
}

#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub sprint_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
}

impl<'a, R, C> Tasks<'a, R, C>
where
    R: ProjectRepository + ?Sized,
    C: CounterRepository + ?Sized,
{
    async fn check_assignee(&self, project_id: Uuid, assignee_id: Uuid) -> ServiceResult<()> {
        if self.repo.member_role(project_id, assignee_id).await?.is_none() {
            return Err(ServiceError::unprocessable(
                "assignee must be a member of the project",
            ));
        }
        Ok(())
    }

    async fn check_sprint(&self, project_id: Uuid, sprint_id: Uuid) -> ServiceResult<()> {
        match self.repo.get_sprint(sprint_id).await? {
            Some(s) if s.project_id == project_id && s.accepts_tasks() => Ok(()),
            Some(s) if s.project_id == project_id => Err(ServiceError::unprocessable(
                "completed sprints do not accept tasks",
            )),
            _ => Err(ServiceError::unprocessable(
                "sprint does not belong to this project",
            )),
        }
    }

    pub async fn create(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        draft: TaskDraft,
    ) -> ServiceResult<Task> {
        let (project, _) = membership(self.repo, project_id, actor_id).await?;
        if let Some(a) = draft.assignee_id {
            self.check_assignee(project_id, a).await?;
        }
        if let Some(s) = draft.sprint_id {
            self.check_sprint(project_id, s).await?;
        }
        let seq = self
            .counters
            .next_value(&sequence::project_task_counter(project_id))
            .await?;
        let task = self
            .repo
            .create_task(&NewTask {
                project_id,
                key: sequence::task_key(&project.key, seq),
                title: draft.title.trim().to_string(),
                description: draft.description,
                priority: draft.priority,
                sprint_id: draft.sprint_id,
                assignee_id: draft.assignee_id,
                reporter_id: actor_id,
            })
            .await?;
        tracing::info!(task_id = %task.id, key = %task.key, "task_created");
        Ok(task)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        filter: TaskFilter,
    ) -> ServiceResult<Vec<Task>> {
        membership(self.repo, project_id, user_id).await?;
        Ok(self.repo.list_tasks(project_id, &filter).await?)
    }

    pub async fn get(&self, user_id: Uuid, project_id: Uuid, key: &str) -> ServiceResult<Task> {
        membership(self.repo, project_id, user_id).await?;
        self.repo
            .get_task(project_id, &key.to_ascii_uppercase())
            .await?
            .ok_or(ServiceError::NotFound("task"))
    }

    pub async fn update(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        key: &str,
        mut patch: TaskPatch,
    ) -> ServiceResult<Task> {
        let task = self.get(actor_id, project_id, key).await?;
        if let Some(Some(a)) = patch.assignee_id {
            self.check_assignee(project_id, a).await?;
        }
        if let Some(Some(s)) = patch.sprint_id {
            self.check_sprint(project_id, s).await?;
        }
        patch.title = patch.title.map(|t| t.trim().to_string());
        let updated = self
            .repo
            .update_task(task.id, &patch)
            .await?
            .ok_or(ServiceError::NotFound("task"))?;
        tracing::debug!(task_id = %task.id, status = %updated.status, "task_updated");
        Ok(updated)
    }

    /// Reporter or project owner.
    pub async fn delete(&self, actor_id: Uuid, project_id: Uuid, key: &str) -> ServiceResult<()> {
        let (_, role) = membership(self.repo, project_id, actor_id).await?;
        let task = self.get(actor_id, project_id, key).await?;
        if task.reporter.id != actor_id && role != MemberRole::Owner {
            return Err(ServiceError::forbidden(
                "only the reporter or the project owner can delete this task",
            ));
        }
        self.repo.delete_task(task.id).await?;
        tracing::info!(task_id = %task.id, key = %task.key, "task_deleted");
        Ok(())
    }
}

use chrono::NaiveDate;
use uuid::Uuid;

use super::{membership, owned};
use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::project_repository::{NewSprint, ProjectRepository};
use crate::domain::projects::sprint::{Sprint, check_dates};

pub struct Sprints<'a, R: ProjectRepository + ?Sized> {
    pub repo: &'a R,
}

#[derive(Debug, Clone)]
pub struct SprintCompletion {
    pub sprint: Sprint,
    pub moved_to_backlog: u64,
}

impl<'a, R: ProjectRepository + ?Sized> Sprints<'a, R> {
    pub async fn create(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        name: &str,
        goal: Option<&str>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> ServiceResult<Sprint> {
        owned(self.repo, project_id, actor_id).await?;
        check_dates(start_date, end_date)?;
        let sprint = self
            .repo
            .create_sprint(&NewSprint {
                project_id,
                name: name.trim().to_string(),
                goal: goal.map(str::to_string),
                start_date,
                end_date,
            })
            .await?;
        tracing::info!(project_id = %project_id, sprint_id = %sprint.id, "sprint_created");
        Ok(sprint)
    }

    pub async fn list(&self, user_id: Uuid, project_id: Uuid) -> ServiceResult<Vec<Sprint>> {
        membership(self.repo, project_id, user_id).await?;
        Ok(self.repo.list_sprints(project_id).await?)
    }

    async fn sprint(&self, project_id: Uuid, sprint_id: Uuid) -> ServiceResult<Sprint> {
        match self.repo.get_sprint(sprint_id).await? {
            Some(s) if s.project_id == project_id => Ok(s),
            _ => Err(ServiceError::NotFound("sprint")),
        }
    }

    pub async fn start(&self, actor_id: Uuid, project_id: Uuid, sprint_id: Uuid) -> ServiceResult<Sprint> {
        owned(self.repo, project_id, actor_id).await?;
        let sprint = self.sprint(project_id, sprint_id).await?;
        let other_active = self
            .repo
            .active_sprint(project_id)
            .await?
            .is_some_and(|s| s.id != sprint.id);
        sprint.start(other_active)?;
        let started = self
            .repo
            .start_sprint(sprint.id)
            .await?
            .ok_or_else(|| {
                ServiceError::conflict("another sprint is already active in this project")
            })?;
        tracing::info!(sprint_id = %sprint.id, "sprint_started");
        Ok(started)
    }

    pub async fn complete(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        sprint_id: Uuid,
    ) -> ServiceResult<SprintCompletion> {
        owned(self.repo, project_id, actor_id).await?;
        let sprint = self.sprint(project_id, sprint_id).await?;
        sprint.complete()?;
        let (sprint, moved) = self
            .repo
            .complete_sprint(sprint.id)
            .await?
            .ok_or_else(|| ServiceError::conflict("only an active sprint can be completed"))?;
        tracing::info!(sprint_id = %sprint.id, moved, "sprint_completed");
        Ok(SprintCompletion {
            sprint,
            moved_to_backlog: moved,
        })
    }
}

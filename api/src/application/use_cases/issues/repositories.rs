use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::issues_repository::IssuesRepository;
use crate::domain::issues::repository::{Label, Repository, check_repo_name, normalize_color};

pub struct Repositories<'a, R: IssuesRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: IssuesRepository + ?Sized> Repositories<'a, R> {
    pub async fn create(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Repository> {
        let name = name.trim();
        check_repo_name(name)?;
        let created = self
            .repo
            .create_repository(owner_id, name, description)
            .await?
            .ok_or_else(|| ServiceError::conflict(format!("repository '{name}' already exists")))?;
        tracing::info!(repository_id = %created.id, owner_id = %owner_id, "repository_created");
        Ok(created)
    }

    pub async fn list_mine(&self, owner_id: Uuid) -> ServiceResult<Vec<Repository>> {
        Ok(self.repo.list_repositories(owner_id).await?)
    }

    pub async fn get(&self, id: Uuid) -> ServiceResult<Repository> {
        self.repo
            .get_repository(id)
            .await?
            .ok_or(ServiceError::NotFound("repository"))
    }

    async fn owned(&self, actor_id: Uuid, id: Uuid) -> ServiceResult<Repository> {
        let repository = self.get(id).await?;
        if !repository.is_owner(actor_id) {
            return Err(ServiceError::forbidden(
                "only the repository owner can manage labels",
            ));
        }
        Ok(repository)
    }

    pub async fn create_label(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        name: &str,
        color: &str,
    ) -> ServiceResult<Label> {
        self.owned(actor_id, repository_id).await?;
        let color = normalize_color(color)?;
        let name = name.trim();
        self.repo
            .create_label(repository_id, name, &color)
            .await?
            .ok_or_else(|| ServiceError::conflict(format!("label '{name}' already exists")))
    }

    pub async fn labels(&self, repository_id: Uuid) -> ServiceResult<Vec<Label>> {
        self.get(repository_id).await?;
        Ok(self.repo.list_labels(repository_id).await?)
    }

    pub async fn delete_label(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        label_id: Uuid,
    ) -> ServiceResult<()> {
        self.owned(actor_id, repository_id).await?;
        match self.repo.get_label(label_id).await? {
            Some(l) if l.repository_id == repository_id => {}
            _ => return Err(ServiceError::NotFound("label")),
        }
        self.repo.delete_label(label_id).await?;
        Ok(())
    }
}

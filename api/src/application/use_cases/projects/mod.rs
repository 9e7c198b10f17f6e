pub mod projects;
pub mod sprints;
pub mod tasks;

use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::project_repository::ProjectRepository;
use crate::domain::projects::project::{MemberRole, Project};

/// Loads a project visible to `user_id`. Non-members get a 404 so project
/// existence is not leaked.
pub(crate) async fn membership<R: ProjectRepository + ?Sized>(
    repo: &R,
    project_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<(Project, MemberRole)> {
    let project = repo
        .get_project(project_id)
        .await?
        .ok_or(ServiceError::NotFound("project"))?;
    let role = repo
        .member_role(project_id, user_id)
        .await?
        .ok_or(ServiceError::NotFound("project"))?;
    Ok((project, role))
}

pub(crate) async fn owned<R: ProjectRepository + ?Sized>(
    repo: &R,
    project_id: Uuid,
    user_id: Uuid,
) -> ServiceResult<Project> {
    let (project, role) = membership(repo, project_id, user_id).await?;
    if role != MemberRole::Owner {
        return Err(ServiceError::forbidden("only the project owner can do this"));
    }
    Ok(project)
}

#[cfg(test)]
pub(crate) mod fake;

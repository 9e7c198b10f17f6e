use uuid::Uuid;

use super::{membership, owned};
use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::project_repository::ProjectRepository;
use crate::domain::projects::project::{JoinRequest, JoinStatus, Member, Project, normalize_key};

pub struct Projects<'a, R: ProjectRepository + ?Sized> {
    pub repo: &'a R,
}

impl<'a, R: ProjectRepository + ?Sized> Projects<'a, R> {
    pub async fn create(
        &self,
        owner_id: Uuid,
        key: &str,
        name: &str,
        description: Option<&str>,
    ) -> ServiceResult<Project> {
        let key = normalize_key(key)?;
        let project = self
            .repo
            .create_project(&key, name.trim(), description, owner_id)
            .await?
            .ok_or_else(|| ServiceError::conflict(format!("project key {key} is already taken")))?;
        tracing::info!(project_id = %project.id, key = %project.key, "project_created");
        Ok(project)
    }

    pub async fn list_mine(&self, user_id: Uuid) -> ServiceResult<Vec<Project>> {
        Ok(self.repo.list_for_member(user_id).await?)
    }

    pub async fn get(&self, user_id: Uuid, project_id: Uuid) -> ServiceResult<Project> {
        Ok(membership(self.repo, project_id, user_id).await?.0)
    }

    pub async fn members(&self, user_id: Uuid, project_id: Uuid) -> ServiceResult<Vec<Member>> {
        membership(self.repo, project_id, user_id).await?;
        Ok(self.repo.list_members(project_id).await?)
    }

    pub async fn remove_member(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        user_id: Uuid,
    ) -> ServiceResult<()> {
        let project = owned(self.repo, project_id, actor_id).await?;
        if project.is_owner(user_id) {
            return Err(ServiceError::bad_request("the project owner cannot be removed"));
        }
        if !self.repo.remove_member(project_id, user_id).await? {
            return Err(ServiceError::NotFound("member"));
        }
        tracing::info!(project_id = %project_id, user_id = %user_id, "member_removed");
        Ok(())
    }

    pub async fn request_to_join(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        message: Option<&str>,
    ) -> ServiceResult<JoinRequest> {
        if self.repo.get_project(project_id).await?.is_none() {
            return Err(ServiceError::NotFound("project"));
        }
        if self.repo.member_role(project_id, user_id).await?.is_some() {
            return Err(ServiceError::conflict("you are already a member of this project"));
        }
        let request = self
            .repo
            .create_join_request(project_id, user_id, message)
            .await?
            .ok_or_else(|| ServiceError::conflict("a join request is already pending"))?;
        tracing::info!(project_id = %project_id, request_id = %request.id, "join_requested");
        Ok(request)
    }

    pub async fn pending_requests(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
    ) -> ServiceResult<Vec<JoinRequest>> {
        owned(self.repo, project_id, actor_id).await?;
        Ok(self
            .repo
            .list_join_requests(project_id, Some(JoinStatus::Pending))
            .await?)
    }

    pub async fn decide(
        &self,
        actor_id: Uuid,
        project_id: Uuid,
        request_id: Uuid,
        approve: bool,
    ) -> ServiceResult<JoinRequest> {
        owned(self.repo, project_id, actor_id).await?;
        let request = match self.repo.get_join_request(request_id).await? {
            Some(r) if r.project_id == project_id => r,
            _ => return Err(ServiceError::NotFound("join request")),
        };
        let status = request.decide(approve)?;
        let decided = self
            .repo
            .decide_join_request(request.id, status)
            .await?
            .ok_or_else(|| ServiceError::conflict("join request was already decided"))?;
        tracing::info!(project_id = %project_id, request_id = %request.id, status = status.as_str(), "join_request_decided");
        Ok(decided)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::project_repository::NewTask;
    use crate::application::testing::MemUsers;
    use crate::application::use_cases::projects::fake::MemProjects;
    use crate::domain::projects::task::Priority;

    #[tokio::test]
    async fn keys_are_unique_and_normalized() {
        let (users, people) = MemUsers::with_users(&["ann"]);
        let repo = MemProjects::new(&users);
        let projects = Projects { repo: &repo };
        let p = projects.create(people[0].id, "core", "Core", None).await.unwrap();
        assert_eq!(p.key, "CORE");
        assert!(matches!(
            projects.create(people[0].id, "CORE", "Again", None).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            projects.create(people[0].id, "1x", "Bad", None).await,
            Err(ServiceError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn join_flow() {
        let (users, people) = MemUsers::with_users(&["ann", "bob"]);
        let (ann, bob) = (people[0].id, people[1].id);
        let repo = MemProjects::new(&users);
        let projects = Projects { repo: &repo };
        let p = projects.create(ann, "CORE", "Core", None).await.unwrap();

        assert!(matches!(
            projects.get(bob, p.id).await,
            Err(ServiceError::NotFound("project"))
        ));
        assert!(matches!(
            projects.request_to_join(ann, p.id, None).await,
            Err(ServiceError::Conflict(_))
        ));
        let req = projects.request_to_join(bob, p.id, Some("hi")).await.unwrap();
        assert!(matches!(
            projects.request_to_join(bob, p.id, None).await,
            Err(ServiceError::Conflict(_))
        ));
        assert!(matches!(
            projects.decide(bob, p.id, req.id, true).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(projects.pending_requests(ann, p.id).await.unwrap().len(), 1);

        let decided = projects.decide(ann, p.id, req.id, true).await.unwrap();
        assert_eq!(decided.status, JoinStatus::Approved);
        assert!(matches!(
            projects.decide(ann, p.id, req.id, false).await,
            Err(ServiceError::Conflict(_))
        ));
        assert_eq!(projects.members(bob, p.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn owner_cannot_be_removed() {
        let (users, people) = MemUsers::with_users(&["ann", "bob"]);
        let (ann, bob) = (people[0].id, people[1].id);
        let repo = MemProjects::new(&users);
        let projects = Projects { repo: &repo };
        let p = projects.create(ann, "CORE", "Core", None).await.unwrap();
        repo.add_member(p.id, bob);
        assert!(matches!(
            projects.remove_member(bob, p.id, ann).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            projects.remove_member(ann, p.id, ann).await,
            Err(ServiceError::BadRequest(_))
        ));
        projects.remove_member(ann, p.id, bob).await.unwrap();
        assert!(matches!(
            projects.remove_member(ann, p.id, bob).await,
            Err(ServiceError::NotFound("member"))
        ));
    }

    #[tokio::test]
    async fn concurrent_join_requests_leave_one_pending() {
        let (users, people) = MemUsers::with_users(&["ann", "bob"]);
        let (ann, bob) = (people[0].id, people[1].id);
        let repo = MemProjects::new(&users);
        let projects = Projects { repo: &repo };
        let p = projects.create(ann, "CORE", "Core", None).await.unwrap();

        let (a, b) = tokio::join!(
            projects.request_to_join(bob, p.id, Some("first")),
            projects.request_to_join(bob, p.id, Some("second")),
        );
        assert!(a.is_ok() != b.is_ok());
        assert!(matches!(a.err().or(b.err()), Some(ServiceError::Conflict(_))));
        assert_eq!(projects.pending_requests(ann, p.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn removing_a_member_unassigns_their_tasks() {
        let (users, people) = MemUsers::with_users(&["ann", "bob"]);
        let (ann, bob) = (people[0].id, people[1].id);
        let repo = MemProjects::new(&users);
        let projects = Projects { repo: &repo };
        let p = projects.create(ann, "CORE", "Core", None).await.unwrap();
        repo.add_member(p.id, bob);
        for (n, assignee) in [bob, ann].into_iter().enumerate() {
            repo.create_task(&NewTask {
                project_id: p.id,
                key: format!("CORE-{}", n + 1),
                title: "work".into(),
                description: None,
                priority: Priority::Medium,
                sprint_id: None,
                assignee_id: Some(assignee),
                reporter_id: ann,
            })
            .await
            .unwrap();
        }

        projects.remove_member(ann, p.id, bob).await.unwrap();
        let orphaned = repo.get_task(p.id, "CORE-1").await.unwrap().unwrap();
        assert!(orphaned.assignee.is_none());
        let kept = repo.get_task(p.id, "CORE-2").await.unwrap().unwrap();
        assert_eq!(kept.assignee.map(|a| a.id), Some(ann));
    }
}

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::projects::project::{JoinRequest, JoinStatus, Member, MemberRole, Project};
use crate::domain::projects::sprint::Sprint;
use crate::domain::projects::task::{Priority, Task, TaskStatus};

#[derive(Debug, Clone)]
pub struct NewSprint {
    pub project_id: Uuid,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: Uuid,
    pub key: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub sprint_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub reporter_id: Uuid,
}

/// `None` leaves a field untouched; `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub sprint_id: Option<Option<Uuid>>,
    pub assignee_id: Option<Option<Uuid>>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub sprint_id: Option<Uuid>,
    pub backlog_only: bool,
    pub assignee_id: Option<Uuid>,
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Creates the project and the owner's membership. `None` when the key is taken.
    async fn create_project(
        &self,
        key: &str,
        name: &str,
        description: Option<&str>,
        owner_id: Uuid,
    ) -> anyhow::Result<Option<Project>>;
    async fn get_project(&self, id: Uuid) -> anyhow::Result<Option<Project>>;
    async fn list_for_member(&self, user_id: Uuid) -> anyhow::Result<Vec<Project>>;

    async fn member_role(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<MemberRole>>;
    async fn list_members(&self, project_id: Uuid) -> anyhow::Result<Vec<Member>>;
    /// Removes a non-owner membership and unassigns the member's tasks in the project.
    async fn remove_member(&self, project_id: Uuid, user_id: Uuid) -> anyhow::Result<bool>;

    /// Returns `None` when the user already has a pending request for the project.
    async fn create_join_request(
        &self,
        project_id: Uuid,
        user_id: Uuid,
        message: Option<&str>,
    ) -> anyhow::Result<Option<JoinRequest>>;
    async fn get_join_request(&self, id: Uuid) -> anyhow::Result<Option<JoinRequest>>;
    async fn list_join_requests(
        &self,
        project_id: Uuid,
        status: Option<JoinStatus>,
    ) -> anyhow::Result<Vec<JoinRequest>>;
    /// Records the decision; an approval also adds the membership, atomically.
    /// Returns `None` when the request was no longer pending.
    async fn decide_join_request(
        &self,
        id: Uuid,
        status: JoinStatus,
    ) -> anyhow::Result<Option<JoinRequest>>;

    async fn create_sprint(&self, sprint: &NewSprint) -> anyhow::Result<Sprint>;
    async fn get_sprint(&self, id: Uuid) -> anyhow::Result<Option<Sprint>>;
    async fn list_sprints(&self, project_id: Uuid) -> anyhow::Result<Vec<Sprint>>;
    async fn active_sprint(&self, project_id: Uuid) -> anyhow::Result<Option<Sprint>>;
    /// Moves a planned sprint to active. Returns `None` when the sprint is no
    /// longer planned or another sprint of the project is already active.
    async fn start_sprint(&self, id: Uuid) -> anyhow::Result<Option<Sprint>>;
    /// Completes the sprint and moves its unfinished tasks to the backlog.
    /// Returns the sprint and the number of tasks moved.
    async fn complete_sprint(&self, id: Uuid) -> anyhow::Result<Option<(Sprint, u64)>>;

    async fn create_task(&self, task: &NewTask) -> anyhow::Result<Task>;
    async fn get_task(&self, project_id: Uuid, key: &str) -> anyhow::Result<Option<Task>>;
    async fn list_tasks(&self, project_id: Uuid, filter: &TaskFilter) -> anyhow::Result<Vec<Task>>;
    async fn update_task(&self, id: Uuid, patch: &TaskPatch) -> anyhow::Result<Option<Task>>;
    async fn delete_task(&self, id: Uuid) -> anyhow::Result<bool>;
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::issues::issue::{Issue, IssueComment, IssueState};
use crate::domain::issues::pull_request::{PullRequest, PullRequestState};
use crate::domain::issues::repository::{Label, Repository};
use crate::domain::issues::timeline::TimelineEvent;

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub repository_id: Uuid,
    pub number: i64,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub assignee_id: Option<Uuid>,
    pub label_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewPullRequest {
    pub repository_id: Uuid,
    pub number: i64,
    pub author_id: Uuid,
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Clone, Default)]
pub struct IssueFilter {
    pub state: Option<IssueState>,
    pub label: Option<String>,
}

#[async_trait]
pub trait IssuesRepository: Send + Sync {
    /// Returns `None` when the owner already has a repository with that name.
    async fn create_repository(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> anyhow::Result<Option<Repository>>;
    async fn get_repository(&self, id: Uuid) -> anyhow::Result<Option<Repository>>;
    async fn list_repositories(&self, owner_id: Uuid) -> anyhow::Result<Vec<Repository>>;

    /// Returns `None` when the repository already has a label with that name.
    async fn create_label(
        &self,
        repository_id: Uuid,
        name: &str,
        color: &str,
    ) -> anyhow::Result<Option<Label>>;
    async fn list_labels(&self, repository_id: Uuid) -> anyhow::Result<Vec<Label>>;
    async fn get_label(&self, id: Uuid) -> anyhow::Result<Option<Label>>;
    async fn delete_label(&self, id: Uuid) -> anyhow::Result<bool>;

    async fn create_issue(&self, issue: &NewIssue) -> anyhow::Result<Issue>;
    async fn get_issue(&self, repository_id: Uuid, number: i64) -> anyhow::Result<Option<Issue>>;
    async fn list_issues(
        &self,
        repository_id: Uuid,
        filter: &IssueFilter,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<Issue>, i64)>;
    async fn update_issue(
        &self,
        id: Uuid,
        title: Option<&str>,
        body: Option<&str>,
    ) -> anyhow::Result<Option<Issue>>;
    async fn set_issue_state(&self, id: Uuid, state: IssueState) -> anyhow::Result<Option<Issue>>;
    async fn set_issue_assignee(
        &self,
        id: Uuid,
        assignee_id: Option<Uuid>,
    ) -> anyhow::Result<Option<Issue>>;
    /// Returns false when the label was already attached.
    async fn attach_label(&self, issue_id: Uuid, label_id: Uuid) -> anyhow::Result<bool>;
    /// Returns false when the label was not attached.
    async fn detach_label(&self, issue_id: Uuid, label_id: Uuid) -> anyhow::Result<bool>;
    async fn add_comment(
        &self,
        issue_id: Uuid,
        author_id: Uuid,
        body: &str,
    ) -> anyhow::Result<IssueComment>;
    async fn list_comments(&self, issue_id: Uuid) -> anyhow::Result<Vec<IssueComment>>;

    async fn create_pull_request(&self, pr: &NewPullRequest) -> anyhow::Result<PullRequest>;
    async fn get_pull_request(
        &self,
        repository_id: Uuid,
        number: i64,
    ) -> anyhow::Result<Option<PullRequest>>;
    async fn list_pull_requests(
        &self,
        repository_id: Uuid,
        state: Option<PullRequestState>,
        page: PageRequest,
    ) -> anyhow::Result<(Vec<PullRequest>, i64)>;
    async fn set_pull_request_state(
        &self,
        id: Uuid,
        state: PullRequestState,
    ) -> anyhow::Result<Option<PullRequest>>;

    async fn append_event(
        &self,
        subject_id: Uuid,
        actor_id: Uuid,
        kind: &str,
        message: &str,
    ) -> anyhow::Result<()>;
    /// Oldest first.
    async fn timeline(&self, subject_id: Uuid) -> anyhow::Result<Vec<TimelineEvent>>;
}

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::issues_repository::{
    IssueFilter, IssuesRepository, NewIssue, NewPullRequest,
};
use crate::application::testing::MemUsers;
use crate::domain::issues::issue::{Issue, IssueComment, IssueState};
use crate::domain::issues::pull_request::{PullRequest, PullRequestState};
use crate::domain::issues::repository::{Label, Repository};
use crate::domain::issues::timeline::TimelineEvent;
use crate::domain::users::user::UserSummary;

pub struct MemIssues {
    people: Vec<UserSummary>,
    repositories: Mutex<Vec<Repository>>,
    labels: Mutex<Vec<Label>>,
    issues: Mutex<Vec<Issue>>,
    comments: Mutex<Vec<IssueComment>>,
    pulls: Mutex<Vec<PullRequest>>,
    events: Mutex<Vec<TimelineEvent>>,
}

impl MemIssues {
    pub fn new(users: &MemUsers) -> Self {
        Self {
            people: users.summaries(),
            repositories: Mutex::default(),
            labels: Mutex::default(),
            issues: Mutex::default(),
            comments: Mutex::default(),
            pulls: Mutex::default(),
            events: Mutex::default(),
        }
    }

    fn person(&self, id: Uuid) -> UserSummary {
        self.people.iter().find(|p| p.id == id).cloned().unwrap()
    }

    fn update_issue_with(&self, id: Uuid, f: impl FnOnce(&mut Issue)) -> Option<Issue> {
        let mut issues = self.issues.lock().unwrap();
        issues.iter_mut().find(|i| i.id == id).map(|i| {
            f(i);
            i.clone()
        })
    }
}

#[async_trait]
impl IssuesRepository for MemIssues {
    async fn create_repository(
        &self,
        owner_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> anyhow::Result<Option<Repository>> {
        let mut repos = self.repositories.lock().unwrap();
        if repos.iter().any(|r| r.owner.id == owner_id && r.name == name) {
            return Ok(None);
        }
        let r = Repository {
            id: Uuid::new_v4(),
            owner: self.person(owner_id),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: chrono::Utc::now(),
        };
        repos.push(r.clone());
        Ok(Some(r))
    }
    async fn get_repository(&self, id: Uuid) -> anyhow::Result<Option<Repository>> {
        Ok(self.repositories.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }
    async fn list_repositories(&self, _: Uuid) -> anyhow::Result<Vec<Repository>> {
        unimplemented!()
    }
    async fn create_label(&self, repository_id: Uuid, name: &str, color: &str) -> anyhow::Result<Option<Label>> {
        let mut labels = self.labels.lock().unwrap();
        if labels.iter().any(|l| l.repository_id == repository_id && l.name == name) {
            return Ok(None);
        }
        let l = Label {
            id: Uuid::new_v4(),
            repository_id,
            name: name.to_string(),
            color: color.to_string(),
        };
        labels.push(l.clone());
        Ok(Some(l))
    }
    async fn list_labels(&self, repository_id: Uuid) -> anyhow::Result<Vec<Label>> {
        Ok(self
            .labels
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.repository_id == repository_id)
            .cloned()
            .collect())
    }
    async fn get_label(&self, id: Uuid) -> anyhow::Result<Option<Label>> {
        Ok(self.labels.lock().unwrap().iter().find(|l| l.id == id).cloned())
    }
    async fn delete_label(&self, _: Uuid) -> anyhow::Result<bool> {
        unimplemented!()
    }
    async fn create_issue(&self, n: &NewIssue) -> anyhow::Result<Issue> {
        let labels = self
            .labels
            .lock()
            .unwrap()
            .iter()
            .filter(|l| n.label_ids.contains(&l.id))
            .cloned()
            .collect();
        let issue = Issue {
            id: Uuid::new_v4(),
            repository_id: n.repository_id,
            number: n.number,
            author: self.person(n.author_id),
            title: n.title.clone(),
            body: n.body.clone(),
            state: IssueState::Open,
            assignee: n.assignee_id.map(|id| self.person(id)),
            labels,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            closed_at: None,
        };
        self.issues.lock().unwrap().push(issue.clone());
        Ok(issue)
    }
    async fn get_issue(&self, repository_id: Uuid, number: i64) -> anyhow::Result<Option<Issue>> {
        Ok(self
            .issues
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.repository_id == repository_id && i.number == number)
            .cloned())
    }
    async fn list_issues(&self, _: Uuid, _: &IssueFilter, _: PageRequest) -> anyhow::Result<(Vec<Issue>, i64)> {
        unimplemented!()
    }
    async fn update_issue(&self, id: Uuid, title: Option<&str>, body: Option<&str>) -> anyhow::Result<Option<Issue>> {
        Ok(self.update_issue_with(id, |i| {
            if let Some(t) = title {
                i.title = t.to_string();
            }
            if let Some(b) = body {
                i.body = b.to_string();
            }
        }))
    }
    async fn set_issue_state(&self, id: Uuid, state: IssueState) -> anyhow::Result<Option<Issue>> {
        Ok(self.update_issue_with(id, |i| i.state = state))
    }
    async fn set_issue_assignee(&self, id: Uuid, assignee_id: Option<Uuid>) -> anyhow::Result<Option<Issue>> {
        let assignee = assignee_id.map(|a| self.person(a));
        Ok(self.update_issue_with(id, |i| i.assignee = assignee))
    }
    async fn attach_label(&self, issue_id: Uuid, label_id: Uuid) -> anyhow::Result<bool> {
        let label = self
            .labels
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == label_id)
            .cloned()
            .unwrap();
        let mut attached = false;
        self.update_issue_with(issue_id, |i| {
            if !i.has_label(label_id) {
                i.labels.push(label);
                attached = true;
            }
        });
        Ok(attached)
    }
    async fn detach_label(&self, issue_id: Uuid, label_id: Uuid) -> anyhow::Result<bool> {
        let mut detached = false;
        self.update_issue_with(issue_id, |i| {
            detached = i.has_label(label_id);
            i.labels.retain(|l| l.id != label_id);
        });
        Ok(detached)
    }
    async fn add_comment(&self, issue_id: Uuid, author_id: Uuid, body: &str) -> anyhow::Result<IssueComment> {
        let c = IssueComment {
            id: Uuid::new_v4(),
            issue_id,
            author: self.person(author_id),
            body: body.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.comments.lock().unwrap().push(c.clone());
        Ok(c)
    }
    async fn list_comments(&self, issue_id: Uuid) -> anyhow::Result<Vec<IssueComment>> {
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.issue_id == issue_id)
            .cloned()
            .collect())
    }
    async fn create_pull_request(&self, n: &NewPullRequest) -> anyhow::Result<PullRequest> {
        let pr = PullRequest {
            id: Uuid::new_v4(),
            repository_id: n.repository_id,
            number: n.number,
            author: self.person(n.author_id),
            title: n.title.clone(),
            body: n.body.clone(),
            head: n.head.clone(),
            base: n.base.clone(),
            state: PullRequestState::Open,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            merged_at: None,
            closed_at: None,
        };
        self.pulls.lock().unwrap().push(pr.clone());
        Ok(pr)
    }
    async fn get_pull_request(&self, repository_id: Uuid, number: i64) -> anyhow::Result<Option<PullRequest>> {
        Ok(self
            .pulls
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.repository_id == repository_id && p.number == number)
            .cloned())
    }
    async fn list_pull_requests(
        &self,
        _: Uuid,
        _: Option<PullRequestState>,
        _: PageRequest,
    ) -> anyhow::Result<(Vec<PullRequest>, i64)> {
        unimplemented!()
    }
    async fn set_pull_request_state(&self, id: Uuid, state: PullRequestState) -> anyhow::Result<Option<PullRequest>> {
        let mut pulls = self.pulls.lock().unwrap();
        Ok(pulls.iter_mut().find(|p| p.id == id).map(|p| {
            p.state = state;
            p.clone()
        }))
    }
    async fn append_event(&self, subject_id: Uuid, actor_id: Uuid, kind: &str, message: &str) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(TimelineEvent {
            id: Uuid::new_v4(),
            subject_id,
            actor: self.person(actor_id),
            kind: kind.to_string(),
            message: message.to_string(),
            created_at: chrono::Utc::now(),
        });
        Ok(())
    }
    async fn timeline(&self, subject_id: Uuid) -> anyhow::Result<Vec<TimelineEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect())
    }
}

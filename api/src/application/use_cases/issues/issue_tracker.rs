use uuid::Uuid;

use super::timeline::{actor, record};
use crate::application::error::{ServiceError, ServiceResult};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::ports::counter_repository::CounterRepository;
use crate::application::ports::issues_repository::{IssueFilter, IssuesRepository, NewIssue};
use crate::application::ports::user_repository::UserRepository;
use crate::domain::issues::issue::{Issue, IssueComment, IssueState};
use crate::domain::issues::repository::Repository;
use crate::domain::issues::timeline::{EventKind, Subject, TimelineEvent};
use crate::domain::sequence;
use crate::domain::users::user::UserSummary;

pub struct IssueTracker<'a, R, C, U>
where
    R: IssuesRepository + ?Sized,
    C: CounterRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    pub repo: &'a R,
    pub counters: &'a C,
    pub users: &'a U,
}

#[derive(Debug, Clone)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    pub assignee_id: Option<Uuid>,
    pub label_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct IssueDetail {
    pub issue: Issue,
    pub comments: Vec<IssueComment>,
    pub timeline: Vec<TimelineEvent>,
}

impl<'a, R, C, U> IssueTracker<'a, R, C, U>
where
    R: IssuesRepository + ?Sized,
    C: CounterRepository + ?Sized,
    U: UserRepository + ?Sized,
{
    async fn repository(&self, id: Uuid) -> ServiceResult<Repository> {
        self.repo
            .get_repository(id)
            .await?
            .ok_or(ServiceError::NotFound("repository"))
    }

    async fn issue(&self, repository_id: Uuid, number: i64) -> ServiceResult<Issue> {
        self.repo
            .get_issue(repository_id, number)
            .await?
            .ok_or(ServiceError::NotFound("issue"))
    }

    /// Loads the issue and checks that `actor_id` is its author or the
    /// repository owner.
    async fn editable(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        number: i64,
    ) -> ServiceResult<Issue> {
        let repository = self.repository(repository_id).await?;
        let issue = self.issue(repository_id, number).await?;
        if issue.author.id != actor_id && !repository.is_owner(actor_id) {
            return Err(ServiceError::forbidden(
                "only the author or the repository owner can change this issue",
            ));
        }
        Ok(issue)
    }

    async fn assignee(&self, id: Uuid) -> ServiceResult<UserSummary> {
        self.users
            .find_by_id(id)
            .await?
            .map(|u| UserSummary::from(&u))
            .ok_or_else(|| ServiceError::unprocessable("assignee does not exist"))
    }

    pub async fn open(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        draft: IssueDraft,
    ) -> ServiceResult<Issue> {
        let me = actor(self.users, actor_id).await?;
        self.repository(repository_id).await?;
        if let Some(id) = draft.assignee_id {
            self.assignee(id).await?;
        }
        let labels = self.repo.list_labels(repository_id).await?;
        if let Some(missing) = draft
            .label_ids
            .iter()
            .find(|id| !labels.iter().any(|l| l.id == **id))
        {
            return Err(ServiceError::unprocessable(format!(
                "label {missing} does not belong to this repository"
            )));
        }
        let mut label_ids = draft.label_ids.clone();
        label_ids.sort();
        label_ids.dedup();
        let number = self
            .counters
            .next_value(&sequence::issue_number_counter(repository_id))
            .await?;
        let issue = self
            .repo
            .create_issue(&NewIssue {
                repository_id,
                number,
                author_id: actor_id,
                title: draft.title.trim().to_string(),
                body: draft.body,
                assignee_id: draft.assignee_id,
                label_ids,
            })
            .await?;
        record(self.repo, issue.id, Subject::Issue, &me, EventKind::Opened).await?;
        tracing::info!(issue_id = %issue.id, number, repository_id = %repository_id, "issue_opened");
        Ok(issue)
    }

    pub async fn list(
        &self,
        repository_id: Uuid,
        filter: IssueFilter,
        page: PageRequest,
    ) -> ServiceResult<Paginated<Issue>> {
        self.repository(repository_id).await?;
        let (items, total) = self.repo.list_issues(repository_id, &filter, page).await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn get(&self, repository_id: Uuid, number: i64) -> ServiceResult<IssueDetail> {
        let issue = self.issue(repository_id, number).await?;
        let comments = self.repo.list_comments(issue.id).await?;
        let timeline = self.repo.timeline(issue.id).await?;
        Ok(IssueDetail {
            issue,
            comments,
            timeline,
        })
    }

    pub async fn edit(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        number: i64,
        title: Option<&str>,
        body: Option<&str>,
    ) -> ServiceResult<Issue> {
        let issue = self.editable(actor_id, repository_id, number).await?;
        let me = actor(self.users, actor_id).await?;
        let updated = self
            .repo
            .update_issue(issue.id, title.map(str::trim), body)
            .await?
            .ok_or(ServiceError::NotFound("issue"))?;
        record(self.repo, issue.id, Subject::Issue, &me, EventKind::Edited).await?;
        Ok(updated)
    }

    pub async fn close(&self, actor_id: Uuid, repository_id: Uuid, number: i64) -> ServiceResult<Issue> {
        let issue = self.editable(actor_id, repository_id, number).await?;
        let next = issue.close()?;
        self.set_state(actor_id, &issue, next, EventKind::Closed).await
    }

    pub async fn reopen(&self, actor_id: Uuid, repository_id: Uuid, number: i64) -> ServiceResult<Issue> {
        let issue = self.editable(actor_id, repository_id, number).await?;
        let next = issue.reopen()?;
        self.set_state(actor_id, &issue, next, EventKind::Reopened).await
    }

    async fn set_state(
        &self,
        actor_id: Uuid,
        issue: &Issue,
        state: IssueState,
        event: EventKind,
    ) -> ServiceResult<Issue> {
        let me = actor(self.users, actor_id).await?;
        let updated = self
            .repo
            .set_issue_state(issue.id, state)
            .await?
            .ok_or(ServiceError::NotFound("issue"))?;
        record(self.repo, issue.id, Subject::Issue, &me, event).await?;
        tracing::info!(issue_id = %issue.id, state = %state, "issue_state_changed");
        Ok(updated)
    }

    /// `None` clears the assignee.
    pub async fn assign(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        number: i64,
        assignee_id: Option<Uuid>,
    ) -> ServiceResult<Issue> {
        let issue = self.editable(actor_id, repository_id, number).await?;
        let me = actor(self.users, actor_id).await?;
        let event = match assignee_id {
            Some(id) => EventKind::Assigned(self.assignee(id).await?.name),
            None => EventKind::Unassigned,
        };
        let updated = self
            .repo
            .set_issue_assignee(issue.id, assignee_id)
            .await?
            .ok_or(ServiceError::NotFound("issue"))?;
        record(self.repo, issue.id, Subject::Issue, &me, event).await?;
        Ok(updated)
    }

    pub async fn add_label(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        number: i64,
        label_id: Uuid,
    ) -> ServiceResult<Issue> {
        let issue = self.editable(actor_id, repository_id, number).await?;
        let label = match self.repo.get_label(label_id).await? {
            Some(l) if l.repository_id == repository_id => l,
            _ => {
                return Err(ServiceError::unprocessable(
                    "label does not belong to this repository",
                ));
            }
        };
        if !self.repo.attach_label(issue.id, label.id).await? {
            return Err(ServiceError::conflict(format!(
                "issue already has the label {}",
                label.name
            )));
        }
        let me = actor(self.users, actor_id).await?;
        record(self.repo, issue.id, Subject::Issue, &me, EventKind::Labeled(label.name)).await?;
        self.issue(repository_id, number).await
    }

    pub async fn remove_label(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        number: i64,
        label_id: Uuid,
    ) -> ServiceResult<Issue> {
        let issue = self.editable(actor_id, repository_id, number).await?;
        let Some(label) = issue.labels.iter().find(|l| l.id == label_id).cloned() else {
            return Err(ServiceError::NotFound("label"));
        };
        self.repo.detach_label(issue.id, label.id).await?;
        let me = actor(self.users, actor_id).await?;
        record(self.repo, issue.id, Subject::Issue, &me, EventKind::Unlabeled(label.name)).await?;
        self.issue(repository_id, number).await
    }

    pub async fn comment(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        number: i64,
        body: &str,
    ) -> ServiceResult<IssueComment> {
        let issue = self.issue(repository_id, number).await?;
        let me = actor(self.users, actor_id).await?;
        let comment = self.repo.add_comment(issue.id, actor_id, body).await?;
        record(self.repo, issue.id, Subject::Issue, &me, EventKind::Commented).await?;
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{MemCounters, MemUsers};
    use crate::application::use_cases::issues::fake::MemIssues;
    use crate::application::use_cases::issues::pull_requests::{PullRequestDraft, PullRequests};
    use crate::application::use_cases::issues::repositories::Repositories;

    fn draft(title: &str) -> IssueDraft {
        IssueDraft {
            title: title.into(),
            body: String::new(),
            assignee_id: None,
            label_ids: vec![],
        }
    }

    #[tokio::test]
    async fn issue_lifecycle_writes_a_timeline() {
        let (users, people) = MemUsers::with_users(&["alice", "bob"]);
        let (alice, bob) = (&people[0], &people[1]);
        let repo = MemIssues::new(&users);
        let counters = MemCounters::default();
        let repository = Repositories { repo: &repo }
            .create(alice.id, "widgets", None)
            .await
            .unwrap();
        let bug = Repositories { repo: &repo }
            .create_label(alice.id, repository.id, "bug", "D73A4A")
            .await
            .unwrap();
        assert_eq!(bug.color, "#d73a4a");

        let tracker = IssueTracker {
            repo: &repo,
            counters: &counters,
            users: &users,
        };
        let issue = tracker.open(bob.id, repository.id, draft("crash")).await.unwrap();
        assert_eq!(issue.number, 1);
        tracker
            .add_label(alice.id, repository.id, 1, bug.id)
            .await
            .unwrap();
        tracker
            .assign(bob.id, repository.id, 1, Some(bob.id))
            .await
            .unwrap();
        let closed = tracker.close(bob.id, repository.id, 1).await.unwrap();
        assert_eq!(closed.state, IssueState::Closed);
        assert!(matches!(
            tracker.close(bob.id, repository.id, 1).await,
            Err(ServiceError::Conflict(_))
        ));

        let detail = tracker.get(repository.id, 1).await.unwrap();
        let messages: Vec<_> = detail.timeline.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "bob opened this issue",
                "alice added the label bug",
                "bob self-assigned this issue",
                "bob closed this issue",
            ]
        );
        assert!(detail.issue.has_label(bug.id));
    }

    #[tokio::test]
    async fn only_author_or_owner_may_close() {
        let (users, people) = MemUsers::with_users(&["alice", "bob", "cy"]);
        let repo = MemIssues::new(&users);
        let counters = MemCounters::default();
        let repository = Repositories { repo: &repo }
            .create(people[0].id, "widgets", None)
            .await
            .unwrap();
        let tracker = IssueTracker {
            repo: &repo,
            counters: &counters,
            users: &users,
        };
        tracker.open(people[1].id, repository.id, draft("a")).await.unwrap();
        assert!(matches!(
            tracker.close(people[2].id, repository.id, 1).await,
            Err(ServiceError::Forbidden(_))
        ));
        tracker.close(people[0].id, repository.id, 1).await.unwrap();
    }

    #[tokio::test]
    async fn foreign_labels_are_rejected() {
        let (users, people) = MemUsers::with_users(&["alice"]);
        let alice = people[0].id;
        let repo = MemIssues::new(&users);
        let counters = MemCounters::default();
        let repos = Repositories { repo: &repo };
        let one = repos.create(alice, "one", None).await.unwrap();
        let two = repos.create(alice, "two", None).await.unwrap();
        let foreign = repos.create_label(alice, two.id, "bug", "#000000").await.unwrap();
        let tracker = IssueTracker {
            repo: &repo,
            counters: &counters,
            users: &users,
        };
        let mut d = draft("x");
        d.label_ids = vec![foreign.id];
        assert!(matches!(
            tracker.open(alice, one.id, d).await,
            Err(ServiceError::Unprocessable(_))
        ));
    }

    #[tokio::test]
    async fn issues_and_pull_requests_share_numbers() {
        let (users, people) = MemUsers::with_users(&["alice"]);
        let alice = people[0].id;
        let repo = MemIssues::new(&users);
        let counters = MemCounters::default();
        let repository = Repositories { repo: &repo }
            .create(alice, "widgets", None)
            .await
            .unwrap();
        let tracker = IssueTracker {
            repo: &repo,
            counters: &counters,
            users: &users,
        };
        let prs = PullRequests {
            repo: &repo,
            counters: &counters,
            users: &users,
        };
        tracker.open(alice, repository.id, draft("a")).await.unwrap();
        let pr = prs
            .open(
                alice,
                repository.id,
                PullRequestDraft {
                    title: "fix".into(),
                    body: String::new(),
                    head: "fix-a".into(),
                    base: "main".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!(pr.number, 2);
        let issue = tracker.open(alice, repository.id, draft("b")).await.unwrap();
        assert_eq!(issue.number, 3);
    }
}

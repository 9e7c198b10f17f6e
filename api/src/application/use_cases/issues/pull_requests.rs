use uuid::Uuid;

use super::timeline::{actor, record};
use crate::application::error::{ServiceError, ServiceResult};
use crate::application::pagination::{PageRequest, Paginated};
use crate::application::ports::counter_repository::CounterRepository;
use crate::application::ports::issues_repository::{IssuesRepository, NewPullRequest};
use crate::application::ports::user_repository::UserRepository;
use crate::domain::issues::pull_request::{PullRequest, PullRequestState, check_branches};
use crate::domain::issues::repository::Repository;
use crate::domain::issues::timeline::{EventKind, Subject, TimelineEvent};
use crate::domain::sequence;

pub struct PullRequests<'a, R, C, U>
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
pub struct PullRequestDraft {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Clone)]
pub struct PullRequestDetail {
    pub pull_request: PullRequest,
    pub timeline: Vec<TimelineEvent>,
}

enum Action {
    Merge,
    Close,
    Reopen,
}

impl<'a, R, C, U> PullRequests<'a, R, C, U>
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

    async fn find(&self, repository_id: Uuid, number: i64) -> ServiceResult<PullRequest> {
        self.repo
            .get_pull_request(repository_id, number)
            .await?
            .ok_or(ServiceError::NotFound("pull request"))
    }

    pub async fn open(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        draft: PullRequestDraft,
    ) -> ServiceResult<PullRequest> {
        check_branches(&draft.head, &draft.base)?;
        self.repository(repository_id).await?;
        let me = actor(self.users, actor_id).await?;
        let number = self
            .counters
            .next_value(&sequence::issue_number_counter(repository_id))
            .await?;
        let pr = self
            .repo
            .create_pull_request(&NewPullRequest {
                repository_id,
                number,
                author_id: actor_id,
                title: draft.title.trim().to_string(),
                body: draft.body,
                head: draft.head.trim().to_string(),
                base: draft.base.trim().to_string(),
            })
            .await?;
        record(self.repo, pr.id, Subject::PullRequest, &me, EventKind::Opened).await?;
        tracing::info!(pull_request_id = %pr.id, number, repository_id = %repository_id, "pull_request_opened");
        Ok(pr)
    }

    pub async fn list(
        &self,
        repository_id: Uuid,
        state: Option<PullRequestState>,
        page: PageRequest,
    ) -> ServiceResult<Paginated<PullRequest>> {
        self.repository(repository_id).await?;
        let (items, total) = self
            .repo
            .list_pull_requests(repository_id, state, page)
            .await?;
        Ok(Paginated::new(items, page, total))
    }

    pub async fn get(&self, repository_id: Uuid, number: i64) -> ServiceResult<PullRequestDetail> {
        let pull_request = self.find(repository_id, number).await?;
        let timeline = self.repo.timeline(pull_request.id).await?;
        Ok(PullRequestDetail {
            pull_request,
            timeline,
        })
    }

    /// Repository owner only.
    pub async fn merge(&self, actor_id: Uuid, repository_id: Uuid, number: i64) -> ServiceResult<PullRequest> {
        self.act(actor_id, repository_id, number, Action::Merge).await
    }

    pub async fn close(&self, actor_id: Uuid, repository_id: Uuid, number: i64) -> ServiceResult<PullRequest> {
        self.act(actor_id, repository_id, number, Action::Close).await
    }

    pub async fn reopen(&self, actor_id: Uuid, repository_id: Uuid, number: i64) -> ServiceResult<PullRequest> {
        self.act(actor_id, repository_id, number, Action::Reopen).await
    }

    async fn act(
        &self,
        actor_id: Uuid,
        repository_id: Uuid,
        number: i64,
        action: Action,
    ) -> ServiceResult<PullRequest> {
        let repository = self.repository(repository_id).await?;
        let pr = self.find(repository_id, number).await?;
        let owner = repository.is_owner(actor_id);
        let (next, event) = match action {
            Action::Merge => {
                if !owner {
                    return Err(ServiceError::forbidden(
                        "only the repository owner can merge pull requests",
                    ));
                }
                (pr.merge()?, EventKind::Merged)
            }
            Action::Close | Action::Reopen if !owner && pr.author.id != actor_id => {
                return Err(ServiceError::forbidden(
                    "only the author or the repository owner can change this pull request",
                ));
            }
            Action::Close => (pr.close()?, EventKind::Closed),
            Action::Reopen => (pr.reopen()?, EventKind::Reopened),
        };
        let me = actor(self.users, actor_id).await?;
        let updated = self
            .repo
            .set_pull_request_state(pr.id, next)
            .await?
            .ok_or(ServiceError::NotFound("pull request"))?;
        record(self.repo, pr.id, Subject::PullRequest, &me, event).await?;
        tracing::info!(pull_request_id = %pr.id, state = %next, "pull_request_state_changed");
        Ok(updated)
    }
}

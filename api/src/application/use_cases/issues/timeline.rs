use uuid::Uuid;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::issues_repository::IssuesRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::domain::issues::timeline::{EventKind, Subject, narrate};
use crate::domain::users::user::UserSummary;

pub(super) async fn actor<U: UserRepository + ?Sized>(
    users: &U,
    id: Uuid,
) -> ServiceResult<UserSummary> {
    users
        .find_by_id(id)
        .await?
        .map(|u| UserSummary::from(&u))
        .ok_or(ServiceError::Unauthorized)
}

pub(super) async fn record<R: IssuesRepository + ?Sized>(
    repo: &R,
    subject_id: Uuid,
    subject: Subject,
    actor: &UserSummary,
    kind: EventKind,
) -> ServiceResult<()> {
    let message = narrate(&actor.name, subject, &kind);
    repo.append_event(subject_id, actor.id, kind.code(), &message)
        .await?;
    tracing::debug!(subject_id = %subject_id, kind = kind.code(), "timeline_event");
    Ok(())
}

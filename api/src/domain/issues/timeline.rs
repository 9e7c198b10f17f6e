use uuid::Uuid;

use crate::domain::users::user::UserSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Opened,
    Edited,
    Closed,
    Reopened,
    Merged,
    Labeled(String),
    Unlabeled(String),
    Assigned(String),
    Unassigned,
    Commented,
}

impl EventKind {
    pub fn code(&self) -> &'static str {
        match self {
            EventKind::Opened => "opened",
            EventKind::Edited => "edited",
            EventKind::Closed => "closed",
            EventKind::Reopened => "reopened",
            EventKind::Merged => "merged",
            EventKind::Labeled(_) => "labeled",
            EventKind::Unlabeled(_) => "unlabeled",
            EventKind::Assigned(_) => "assigned",
            EventKind::Unassigned => "unassigned",
            EventKind::Commented => "commented",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Issue,
    PullRequest,
}

impl Subject {
    fn noun(&self) -> &'static str {
        match self {
            Subject::Issue => "issue",
            Subject::PullRequest => "pull request",
        }
    }
}

/// Human-readable line describing what `actor` did to the subject.
pub fn narrate(actor: &str, subject: Subject, kind: &EventKind) -> String {
    let noun = subject.noun();
    match kind {
        EventKind::Opened => format!("{actor} opened this {noun}"),
        EventKind::Edited => format!("{actor} edited this {noun}"),
        EventKind::Closed => format!("{actor} closed this {noun}"),
        EventKind::Reopened => format!("{actor} reopened this {noun}"),
        EventKind::Merged => format!("{actor} merged this {noun}"),
        EventKind::Labeled(l) => format!("{actor} added the label {l}"),
        EventKind::Unlabeled(l) => format!("{actor} removed the label {l}"),
        EventKind::Assigned(a) if a == actor => format!("{actor} self-assigned this {noun}"),
        EventKind::Assigned(a) => format!("{actor} assigned {a}"),
        EventKind::Unassigned => format!("{actor} removed the assignee"),
        EventKind::Commented => format!("{actor} commented"),
    }
}

#[derive(Debug, Clone)]
pub struct TimelineEvent {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub actor: UserSummary,
    pub kind: String,
    pub message: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

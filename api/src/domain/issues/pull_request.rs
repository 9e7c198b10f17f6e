use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::domain::rules::RuleViolation;
use crate::domain::users::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestState {
    Open,
    Closed,
    Merged,
}

impl PullRequestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestState::Open => "open",
            PullRequestState::Closed => "closed",
            PullRequestState::Merged => "merged",
        }
    }
}

impl fmt::Display for PullRequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PullRequestState {
    type Err = RuleViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(PullRequestState::Open),
            "closed" => Ok(PullRequestState::Closed),
            "merged" => Ok(PullRequestState::Merged),
            other => Err(RuleViolation::invalid(format!(
                "unknown pull request state: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub number: i64,
    pub author: UserSummary,
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
    pub state: PullRequestState,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub merged_at: Option<chrono::DateTime<chrono::Utc>>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub fn check_branches(head: &str, base: &str) -> Result<(), RuleViolation> {
    if head.trim().is_empty() || base.trim().is_empty() {
        return Err(RuleViolation::invalid("head and base branches are required"));
    }
    if head.trim() == base.trim() {
        return Err(RuleViolation::invalid("head and base must be different branches"));
    }
    Ok(())
}

impl PullRequest {
    pub fn merge(&self) -> Result<PullRequestState, RuleViolation> {
        match self.state {
            PullRequestState::Open => Ok(PullRequestState::Merged),
            PullRequestState::Merged => Err(RuleViolation::conflict("pull request is already merged")),
            PullRequestState::Closed => Err(RuleViolation::conflict(
                "closed pull requests cannot be merged",
            )),
        }
    }

    pub fn close(&self) -> Result<PullRequestState, RuleViolation> {
        match self.state {
            PullRequestState::Open => Ok(PullRequestState::Closed),
            PullRequestState::Closed => Err(RuleViolation::conflict("pull request is already closed")),
            PullRequestState::Merged => Err(RuleViolation::conflict(
                "merged pull requests cannot be closed",
            )),
        }
    }

    pub fn reopen(&self) -> Result<PullRequestState, RuleViolation> {
        match self.state {
            PullRequestState::Closed => Ok(PullRequestState::Open),
            PullRequestState::Open => Err(RuleViolation::conflict("pull request is already open")),
            PullRequestState::Merged => Err(RuleViolation::conflict(
                "merged pull requests cannot be reopened",
            )),
        }
    }
}

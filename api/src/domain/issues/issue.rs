use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::domain::issues::repository::Label;
use crate::domain::rules::RuleViolation;
use crate::domain::users::user::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueState {
    type Err = RuleViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(IssueState::Open),
            "closed" => Ok(IssueState::Closed),
            other => Err(RuleViolation::invalid(format!("unknown issue state: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Issue {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub number: i64,
    pub author: UserSummary,
    pub title: String,
    pub body: String,
    pub state: IssueState,
    pub assignee: Option<UserSummary>,
    pub labels: Vec<Label>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub closed_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Issue {
    pub fn close(&self) -> Result<IssueState, RuleViolation> {
        match self.state {
            IssueState::Open => Ok(IssueState::Closed),
            IssueState::Closed => Err(RuleViolation::conflict("issue is already closed")),
        }
    }

    pub fn reopen(&self) -> Result<IssueState, RuleViolation> {
        match self.state {
            IssueState::Closed => Ok(IssueState::Open),
            IssueState::Open => Err(RuleViolation::conflict("issue is already open")),
        }
    }

    pub fn has_label(&self, label_id: Uuid) -> bool {
        self.labels.iter().any(|l| l.id == label_id)
    }
}

#[derive(Debug, Clone)]
pub struct IssueComment {
    pub id: Uuid,
    pub issue_id: Uuid,
    pub author: UserSummary,
    pub body: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(state: IssueState) -> Issue {
        Issue {
            id: Uuid::new_v4(),
            repository_id: Uuid::new_v4(),
            number: 1,
            author: UserSummary {
                id: Uuid::new_v4(),
                name: "ann".into(),
            },
            title: "t".into(),
            body: String::new(),
            state,
            assignee: None,
            labels: vec![],
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            closed_at: None,
        }
    }

    #[test]
    fn close_and_reopen_only_flip_state_once() {
        assert_eq!(issue(IssueState::Open).close().unwrap(), IssueState::Closed);
        assert!(issue(IssueState::Closed).close().is_err());
        assert_eq!(issue(IssueState::Closed).reopen().unwrap(), IssueState::Open);
        assert!(issue(IssueState::Open).reopen().is_err());
    }
}

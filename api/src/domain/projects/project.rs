use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::domain::rules::RuleViolation;
use crate::domain::users::user::UserSummary;

static PROJECT_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9]{1,9}$").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct Project {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Project {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Owner => "owner",
            MemberRole::Member => "member",
        }
    }
}

impl FromStr for MemberRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(MemberRole::Owner),
            "member" => Ok(MemberRole::Member),
            other => anyhow::bail!("unknown member role: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Member {
    pub user: UserSummary,
    pub role: MemberRole,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStatus {
    Pending,
    Approved,
    Rejected,
}

impl JoinStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStatus::Pending => "pending",
            JoinStatus::Approved => "approved",
            JoinStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for JoinStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JoinStatus::Pending),
            "approved" => Ok(JoinStatus::Approved),
            "rejected" => Ok(JoinStatus::Rejected),
            other => anyhow::bail!("unknown join request status: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JoinRequest {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user: UserSummary,
    pub message: Option<String>,
    pub status: JoinStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub decided_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl JoinRequest {
    pub fn decide(&self, approve: bool) -> Result<JoinStatus, RuleViolation> {
        if self.status != JoinStatus::Pending {
            return Err(RuleViolation::conflict(format!(
                "join request was already {}",
                self.status.as_str()
            )));
        }
        Ok(if approve {
            JoinStatus::Approved
        } else {
            JoinStatus::Rejected
        })
    }
}

/// Upper-cases and validates a project key such as `CORE` or `WEB2`.
pub fn normalize_key(raw: &str) -> Result<String, RuleViolation> {
    let key = raw.trim().to_ascii_uppercase();
    if !PROJECT_KEY_RE.is_match(&key) {
        return Err(RuleViolation::invalid(
            "project key must be 2-10 letters or digits and start with a letter",
        ));
    }
    Ok(key)
}

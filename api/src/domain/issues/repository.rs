use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::domain::rules::RuleViolation;
use crate::domain::users::user::UserSummary;

static REPO_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,100}$").expect("valid regex"));
static COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct Repository {
    pub id: Uuid,
    pub owner: UserSummary,
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Repository {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owner.id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub id: Uuid,
    pub repository_id: Uuid,
    pub name: String,
    pub color: String,
}

pub fn check_repo_name(name: &str) -> Result<(), RuleViolation> {
    if name == "." || name == ".." || !REPO_NAME_RE.is_match(name) {
        return Err(RuleViolation::invalid(
            "repository name may only contain letters, digits, '.', '_' and '-'",
        ));
    }
    Ok(())
}

pub fn normalize_color(raw: &str) -> Result<String, RuleViolation> {
    let c = raw.trim();
    let c = if c.starts_with('#') {
        c.to_string()
    } else {
        format!("#{c}")
    };
    if !COLOR_RE.is_match(&c) {
        return Err(RuleViolation::invalid("color must look like #rrggbb"));
    }
    Ok(c.to_lowercase())
}

use std::str::FromStr;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::rules::RuleViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoPriority {
    Low,
    Medium,
    High,
}

impl TodoPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoPriority::Low => "low",
            TodoPriority::Medium => "medium",
            TodoPriority::High => "high",
        }
    }
}

impl FromStr for TodoPriority {
    type Err = RuleViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(TodoPriority::Low),
            "medium" => Ok(TodoPriority::Medium),
            "high" => Ok(TodoPriority::High),
            other => Err(RuleViolation::invalid(format!("unknown priority: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TodoTask {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TodoPriority,
    pub due_date: Option<NaiveDate>,
    pub completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl TodoTask {
    /// Completion flag and timestamp after flipping the task.
    pub fn toggled(
        &self,
        now: chrono::DateTime<chrono::Utc>,
    ) -> (bool, Option<chrono::DateTime<chrono::Utc>>) {
        if self.completed {
            (false, None)
        } else {
            (true, Some(now))
        }
    }
}

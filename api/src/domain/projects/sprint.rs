use std::str::FromStr;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::rules::RuleViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintStatus {
    Planned,
    Active,
    Completed,
}

impl SprintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SprintStatus::Planned => "planned",
            SprintStatus::Active => "active",
            SprintStatus::Completed => "completed",
        }
    }
}

impl FromStr for SprintStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(SprintStatus::Planned),
            "active" => Ok(SprintStatus::Active),
            "completed" => Ok(SprintStatus::Completed),
            other => anyhow::bail!("unknown sprint status: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sprint {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub fn check_dates(start: NaiveDate, end: NaiveDate) -> Result<(), RuleViolation> {
    if end < start {
        return Err(RuleViolation::invalid("end_date must not be before start_date"));
    }
    Ok(())
}

impl Sprint {
    /// `other_active` tells whether another sprint of the project is running.
    pub fn start(&self, other_active: bool) -> Result<SprintStatus, RuleViolation> {
        if self.status != SprintStatus::Planned {
            return Err(RuleViolation::conflict(format!(
                "sprint is {}, only planned sprints can start",
                self.status.as_str()
            )));
        }
        if other_active {
            return Err(RuleViolation::conflict(
                "another sprint is already active in this project",
            ));
        }
        Ok(SprintStatus::Active)
    }

    pub fn complete(&self) -> Result<SprintStatus, RuleViolation> {
        if self.status != SprintStatus::Active {
            return Err(RuleViolation::conflict("only an active sprint can be completed"));
        }
        Ok(SprintStatus::Completed)
    }

    pub fn accepts_tasks(&self) -> bool {
        self.status != SprintStatus::Completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprint(status: SprintStatus) -> Sprint {
        Sprint {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            name: "S1".into(),
            goal: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 14).unwrap(),
            status,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn end_may_equal_but_not_precede_start() {
        let d = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(check_dates(d, d).is_ok());
        assert!(check_dates(d, d.pred_opt().unwrap()).is_err());
    }

    #[test]
    fn only_one_active_sprint() {
        assert_eq!(sprint(SprintStatus::Planned).start(false).unwrap(), SprintStatus::Active);
        assert!(sprint(SprintStatus::Planned).start(true).is_err());
        assert!(sprint(SprintStatus::Completed).start(false).is_err());
    }

    #[test]
    fn completion_requires_active() {
        assert!(sprint(SprintStatus::Planned).complete().is_err());
        assert_eq!(sprint(SprintStatus::Active).complete().unwrap(), SprintStatus::Completed);
        assert!(!sprint(SprintStatus::Completed).accepts_tasks());
    }
}

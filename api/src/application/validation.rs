//! Field-level request checks.
//!
//! Each route validates its payload through a [`Validator`] before the use
//! case runs; every failing rule is collected so callers see all problems at
//! once.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::application::error::{FieldError, ServiceError};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex")
});

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
        self
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.push(field, message);
        }
        self
    }

    /// Trimmed length within `min..=max` characters.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if len < min {
            if min == 1 {
                self.push(field, "is required");
            } else {
                self.push(field, format!("must be at least {min} characters"));
            }
        } else if len > max {
            self.push(field, format!("must be at most {max} characters"));
        }
        self
    }

    pub fn optional_length(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> &mut Self {
        if let Some(v) = value {
            self.length(field, v, min, max);
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        if !EMAIL_RE.is_match(value.trim()) {
            self.push(field, "must be a valid email address");
        }
        self
    }

    pub fn range(&mut self, field: &str, value: i64, min: i64, max: i64) -> &mut Self {
        if value < min || value > max {
            self.push(field, format!("must be between {min} and {max}"));
        }
        self
    }

    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) -> &mut Self {
        if !allowed.contains(&value) {
            self.push(field, format!("must be one of: {}", allowed.join(", ")));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

use thiserror::Error;

/// A business rule rejected a requested change.
///
/// Domain helpers return this instead of HTTP-flavoured errors; the
/// application layer decides how each kind surfaces to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// The input itself is unacceptable (bad request).
    #[error("{0}")]
    Invalid(String),
    /// The change collides with the current state of the record.
    #[error("{0}")]
    Conflict(String),
    /// The input is well formed but cannot be honoured (e.g. insufficient stock).
    #[error("{0}")]
    Unprocessable(String),
}

impl RuleViolation {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::Unprocessable(msg.into())
    }
}

pub mod issue_tracker;
pub mod pull_requests;
pub mod repositories;
mod timeline;

#[cfg(test)]
pub(crate) mod fake;

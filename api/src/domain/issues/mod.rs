pub mod issue;
pub mod pull_request;
pub mod repository;
pub mod timeline;

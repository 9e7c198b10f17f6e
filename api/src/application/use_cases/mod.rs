pub mod auth;
pub mod bank;
pub mod blog;
pub mod issues;
pub mod projects;
pub mod store;
pub mod todo;

pub mod bank_repository;
pub mod blog_repository;
pub mod counter_repository;
pub mod issues_repository;
pub mod project_repository;
pub mod store_repository;
pub mod todo_repository;
pub mod user_repository;

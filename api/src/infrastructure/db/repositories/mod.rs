pub mod bank_repository_sqlx;
pub mod blog_repository_sqlx;
pub mod counter_repository_sqlx;
pub mod issues_repository_sqlx;
pub mod project_repository_sqlx;
pub mod store_repository_sqlx;
pub mod todo_repository_sqlx;
pub mod user_repository_sqlx;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::domain::users::user::{Role, User, UserSummary};

#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Returns `None` when the email is already registered.
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserCredentials>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Users not in `exclude`, ordered by name.
    async fn list_excluding(
        &self,
        exclude: &[Uuid],
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)>;
}

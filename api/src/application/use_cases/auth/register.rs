use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString},
};
use password_hash::rand_core::OsRng;

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::user_repository::UserRepository;
use crate::domain::users::user::{Role, User, normalize_email};

pub struct Register<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
    pub admin_emails: &'a [String],
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl<'a, R: UserRepository + ?Sized> Register<'a, R> {
    pub async fn execute(&self, req: &RegisterRequest) -> ServiceResult<User> {
        let email = normalize_email(&req.email);
        let role = if self.admin_emails.iter().any(|a| a == &email) {
            Role::Admin
        } else {
            Role::User
        };
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!(e.to_string()))?
            .to_string();
        let user = self
            .repo
            .create_user(&email, req.name.trim(), &hash, role)
            .await?
            .ok_or_else(|| ServiceError::conflict("email is already registered"))?;
        tracing::info!(user_id = %user.id, role = %user.role, "user_registered");
        Ok(user)
    }
}

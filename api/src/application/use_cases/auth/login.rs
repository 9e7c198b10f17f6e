use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

use crate::application::error::{ServiceError, ServiceResult};
use crate::application::ports::user_repository::UserRepository;
use crate::domain::users::user::{User, normalize_email};

pub struct Login<'a, R: UserRepository + ?Sized> {
    pub repo: &'a R,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl<'a, R: UserRepository + ?Sized> Login<'a, R> {
    pub async fn execute(&self, req: &LoginRequest) -> ServiceResult<User> {
        let row = match self.repo.find_by_email(&normalize_email(&req.email)).await? {
            Some(r) => r,
            None => return Err(ServiceError::Unauthorized),
        };
        let parsed =
            PasswordHash::new(&row.password_hash).map_err(|e| anyhow::anyhow!(e.to_string()))?;
        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed)
            .is_ok()
        {
            Ok(row.user)
        } else {
            tracing::debug!(user_id = %row.user.id, "login_password_mismatch");
            Err(ServiceError::Unauthorized)
        }
    }
}

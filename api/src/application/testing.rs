//! In-memory port implementations shared by use-case tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::counter_repository::CounterRepository;
use crate::application::ports::user_repository::{UserCredentials, UserRepository};
use crate::domain::users::user::{Role, User, UserSummary};

#[derive(Default)]
pub struct MemCounters {
    values: Mutex<HashMap<String, i64>>,
}

#[async_trait]
impl CounterRepository for MemCounters {
    async fn next_value(&self, name: &str) -> anyhow::Result<i64> {
        let mut values = self.values.lock().unwrap();
        let v = values.entry(name.to_string()).or_insert(0);
        *v += 1;
        Ok(*v)
    }
}

#[derive(Default)]
pub struct MemUsers {
    users: Mutex<Vec<UserCredentials>>,
}

impl MemUsers {
    pub fn with_users(names: &[&str]) -> (Self, Vec<User>) {
        let repo = Self::default();
        let mut out = Vec::new();
        for name in names {
            let user = User {
                id: Uuid::new_v4(),
                email: format!("{}@example.com", name.to_lowercase()),
                name: name.to_string(),
                role: Role::User,
                created_at: chrono::Utc::now(),
            };
            repo.users.lock().unwrap().push(UserCredentials {
                user: user.clone(),
                password_hash: String::new(),
            });
            out.push(user);
        }
        (repo, out)
    }

    pub fn summaries(&self) -> Vec<UserSummary> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .map(|u| UserSummary::from(&u.user))
            .collect()
    }
}

#[async_trait]
impl UserRepository for MemUsers {
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.user.email == email) {
            return Ok(None);
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            created_at: chrono::Utc::now(),
        };
        users.push(UserCredentials {
            user: user.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(Some(user))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserCredentials>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.id == id)
            .map(|u| u.user.clone()))
    }

    async fn list_excluding(
        &self,
        exclude: &[Uuid],
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)> {
        let mut all: Vec<UserSummary> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| !exclude.contains(&u.user.id))
            .map(|u| UserSummary::from(&u.user))
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        let total = all.len() as i64;
        let items = all
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((items, total))
    }
}

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

use crate::application::pagination::PageRequest;
use crate::application::ports::user_repository::{UserCredentials, UserRepository};
use crate::domain::users::user::{Role, User, UserSummary};
use crate::infrastructure::db::PgPool;

pub struct SqlxUserRepository {
    pub pool: PgPool,
}

impl SqlxUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_user(r: &PgRow) -> anyhow::Result<User> {
    Ok(User {
        id: r.get("id"),
        email: r.get("email"),
        name: r.get("name"),
        role: r.get::<String, _>("role").parse()?,
        created_at: r.get("created_at"),
    })
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        role: Role,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(
            r#"INSERT INTO users (email, name, password_hash, role) VALUES ($1, $2, $3, $4)
               ON CONFLICT (email) DO NOTHING
               RETURNING id, email, name, role, created_at"#,
        )
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(role.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(map_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<UserCredentials>> {
        let row = sqlx::query(
            r#"SELECT id, email, name, role, created_at, password_hash FROM users WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(r) => Ok(Some(UserCredentials {
                user: map_user(&r)?,
                password_hash: r.get("password_hash"),
            })),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query(r#"SELECT id, email, name, role, created_at FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(map_user).transpose()
    }

    async fn list_excluding(
        &self,
        exclude: &[Uuid],
        page: PageRequest,
    ) -> anyhow::Result<(Vec<UserSummary>, i64)> {
        let rows = sqlx::query(
            r#"SELECT id, name, COUNT(*) OVER() AS total
               FROM users WHERE NOT (id = ANY($1))
               ORDER BY name, id
               LIMIT $2 OFFSET $3"#,
        )
        .bind(exclude)
        .bind(page.limit)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        let total = rows.first().map(|r| r.get::<i64, _>("total")).unwrap_or(0);
        let items = rows
            .into_iter()
            .map(|r| UserSummary {
                id: r.get("id"),
                name: r.get("name"),
            })
            .collect();
        Ok((items, total))
    }
}

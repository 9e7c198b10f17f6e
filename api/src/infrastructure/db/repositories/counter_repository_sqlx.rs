use async_trait::async_trait;

use crate::application::ports::counter_repository::CounterRepository;
use crate::infrastructure::db::PgPool;

pub struct SqlxCounterRepository {
    pub pool: PgPool,
}

impl SqlxCounterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterRepository for SqlxCounterRepository {
    async fn next_value(&self, name: &str) -> anyhow::Result<i64> {
        let value: i64 = sqlx::query_scalar(
            r#"INSERT INTO counters (name, value) VALUES ($1, 1)
               ON CONFLICT (name) DO UPDATE SET value = counters.value + 1
               RETURNING value"#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(value)
    }
}

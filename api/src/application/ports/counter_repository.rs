use async_trait::async_trait;

#[async_trait]
pub trait CounterRepository: Send + Sync {
    /// Atomically increments the named counter and returns the new value.
    /// A counter that does not exist yet starts at 1.
    async fn next_value(&self, name: &str) -> anyhow::Result<i64>;
}

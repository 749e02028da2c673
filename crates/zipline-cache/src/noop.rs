use async_trait::async_trait;
use std::time::Duration;
use zipline_core::cache::Result;
use zipline_core::KvCache;

/// A cache that caches nothing.
///
/// Every read misses and every write succeeds silently, so the engine
/// falls through to the store on each operation. Backs cache-disabled
/// deployments.
#[derive(Debug, Clone, Default)]
pub struct NoopCache;

impl NoopCache {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl KvCache for NoopCache {
    async fn get(&self, _key: &str) -> Result<Option<String>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _keys: &[String]) -> Result<()> {
        Ok(())
    }

    async fn increment(&self, _key: &str, delta: i64, _ttl: Option<Duration>) -> Result<i64> {
        // Each increment lands on a key that immediately vanishes.
        Ok(delta)
    }

    async fn exists(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }
}

use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};
use zipline_core::cache::Result;
use zipline_core::{CacheError, KvCache};

/// A Redis-based implementation of [`KvCache`].
///
/// Values are stored as plain strings under a configurable key prefix,
/// so integer values stay compatible with Redis-native `INCRBY`.
#[derive(Debug, Clone)]
pub struct RedisCache {
    conn: redis::aio::MultiplexedConnection,
    key_prefix: String,
}

fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_timeout() {
        CacheError::Timeout(err.to_string())
    } else if err.is_io_error() || err.is_connection_refusal() || err.is_connection_dropped() {
        CacheError::Unavailable(err.to_string())
    } else if matches!(err.kind(), redis::ErrorKind::UnexpectedReturnType) {
        CacheError::InvalidData(err.to_string())
    } else {
        CacheError::Operation(err.to_string())
    }
}

impl RedisCache {
    /// Creates a new Redis cache over an established connection.
    pub fn new(conn: redis::aio::MultiplexedConnection) -> Self {
        Self {
            conn,
            key_prefix: "zl:".to_string(),
        }
    }

    /// Creates a new Redis cache with a custom key prefix.
    pub fn with_prefix(
        conn: redis::aio::MultiplexedConnection,
        key_prefix: impl Into<String>,
    ) -> Self {
        Self {
            conn,
            key_prefix: key_prefix.into(),
        }
    }

    /// Connects to the given Redis URL and wraps the connection.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;
        Ok(Self::new(conn))
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl KvCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let full_key = self.prefixed(key);
        trace!(key = %key, "fetching value from redis");

        let mut conn = self.conn.clone();
        match conn.get::<_, Option<String>>(&full_key).await {
            Ok(Some(value)) => {
                debug!(key = %key, "cache hit in redis");
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(key = %key, "cache miss in redis");
                Ok(None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "redis error on get");
                Err(map_redis_error(e))
            }
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let full_key = self.prefixed(key);
        trace!(key = %key, "storing value in redis");

        let mut conn = self.conn.clone();
        let result = if let Some(ttl) = ttl {
            conn.set_ex::<_, _, ()>(&full_key, value, ttl.as_secs())
                .await
        } else {
            conn.set::<_, _, ()>(&full_key, value).await
        };

        result.map_err(|e| {
            warn!(key = %key, error = %e, "redis error on set");
            map_redis_error(e)
        })
    }

    async fn delete(&self, keys: &[String]) -> Result<()> {
        // DEL with no keys is a protocol error.
        if keys.is_empty() {
            return Ok(());
        }
        let full_keys: Vec<String> = keys.iter().map(|k| self.prefixed(k)).collect();
        trace!(count = keys.len(), "removing keys from redis");

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&full_keys).await.map_err(|e| {
            warn!(error = %e, "redis error on delete");
            map_redis_error(e)
        })
    }

    async fn increment(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64> {
        let full_key = self.prefixed(key);
        trace!(key = %key, delta, "incrementing counter in redis");

        let mut conn = self.conn.clone();
        let value: i64 = conn
            .incr(&full_key, delta)
            .await
            .map_err(|e| {
                warn!(key = %key, error = %e, "redis error on increment");
                map_redis_error(e)
            })?;

        // INCRBY created the key when the result equals the delta; only
        // then does the family TTL apply.
        if value == delta {
            if let Some(ttl) = ttl {
                conn.expire::<_, ()>(&full_key, ttl.as_secs() as i64)
                    .await
                    .map_err(|e| {
                        warn!(key = %key, error = %e, "redis error on expire");
                        map_redis_error(e)
                    })?;
            }
        }

        Ok(value)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_key = self.prefixed(key);

        let mut conn = self.conn.clone();
        conn.exists::<_, bool>(&full_key).await.map_err(|e| {
            warn!(key = %key, error = %e, "redis error on exists");
            map_redis_error(e)
        })
    }
}

// Tests that require a running Redis instance live in
// tests/redis_cache_integration.rs and use the container fixture from
// zipline-test-infra.

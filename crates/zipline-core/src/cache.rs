use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;
use typed_builder::TypedBuilder;

pub type Result<T> = std::result::Result<T, CacheError>;

/// Minimal key-value contract the cache engine depends on.
///
/// Values are strings: JSON for records and lists, plain integer text for
/// ids and counters. Integer text keeps counters compatible with
/// backend-native increments.
#[async_trait]
pub trait KvCache: Send + Sync + 'static {
    /// Fetches the value stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` at `key`. A `ttl` of `None` means no expiry.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Removes the given keys. Keys that do not exist are skipped.
    async fn delete(&self, keys: &[String]) -> Result<()>;

    /// Atomically adds `delta` to the integer at `key` and returns the
    /// new value. The `ttl` applies only when the increment creates the
    /// key.
    async fn increment(&self, key: &str, delta: i64, ttl: Option<Duration>) -> Result<i64>;

    /// Whether `key` currently holds a live value.
    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Cache key builders, one per key family.
pub mod keys {
    use crate::record::UrlId;
    use crate::shortcode::ShortCode;
    use uuid::Uuid;

    /// Full record by id.
    pub fn url_by_id(id: UrlId) -> String {
        format!("id:{id}")
    }

    /// Short code to record id.
    pub fn code_mapping(code: &ShortCode) -> String {
        format!("shortcode_mapping:{code}")
    }

    /// A user's full record list.
    pub fn user_urls(user: Uuid) -> String {
        format!("user:{user}")
    }

    /// Fast-read click counter, non-authoritative.
    pub fn clicks(code: &ShortCode) -> String {
        format!("clicks:{code}")
    }
}

/// Expiry applied to each cache key family.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct CacheTtls {
    /// Full records (`id:` keys).
    #[builder(default = Duration::from_secs(3600))]
    pub url: Duration,
    /// Short-code mappings.
    #[builder(default = Duration::from_secs(7200))]
    pub mapping: Duration,
    /// Per-user record lists.
    #[builder(default = Duration::from_secs(3600))]
    pub user_list: Duration,
    /// Click counters.
    #[builder(default = Duration::from_secs(86400))]
    pub clicks: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::builder().build()
    }
}

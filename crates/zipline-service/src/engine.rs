use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};
use uuid::Uuid;
use zipline_core::cache::{keys, Result as CacheResult};
use zipline_core::store::Result;
use zipline_core::{
    CacheError, CacheTtls, KvCache, Owner, ShortCode, UrlId, UrlRecord, UrlStatus, UrlStore,
};

/// Upper bound on a single cache operation, well below store timeouts.
const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// The cache-consistency engine.
///
/// Composes a durable store with a key-value cache and owns the policy
/// for keeping them coherent: read-through for lookups, invalidation for
/// structural mutations, and force-refresh-from-store for counter and
/// status mutations.
///
/// The cache is an accelerator, never an authority: every cache failure
/// or timeout is logged and degraded to a miss or a no-op, and only
/// store errors propagate to callers.
pub struct CacheEngine<S: ?Sized, C: ?Sized> {
    store: Arc<S>,
    cache: Arc<C>,
    ttls: CacheTtls,
    cache_timeout: Duration,
}

impl<S: ?Sized, C: ?Sized> Clone for CacheEngine<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            cache: Arc::clone(&self.cache),
            ttls: self.ttls,
            cache_timeout: self.cache_timeout,
        }
    }
}

impl<S, C> CacheEngine<S, C>
where
    S: UrlStore + ?Sized,
    C: KvCache + ?Sized,
{
    /// Creates an engine over shared store and cache handles.
    pub fn new(store: Arc<S>, cache: Arc<C>, ttls: CacheTtls) -> Self {
        Self {
            store,
            cache,
            ttls,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    /// Overrides the per-operation cache timeout.
    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// Returns a reference to the durable store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the cache backend.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Read-through lookup of a record by id.
    pub async fn get_by_id(&self, id: UrlId) -> Result<Option<UrlRecord>> {
        let key = keys::url_by_id(id);
        if let Some(record) = self.cache_get::<UrlRecord>(&key).await {
            return Ok(Some(record));
        }

        trace!(id, "record not cached, reading store");
        let Some(record) = self.store.find_by_id(id).await? else {
            return Ok(None);
        };
        self.cache_set(&key, &record, self.ttls.url).await;
        Ok(Some(record))
    }

    /// Read-through resolution of a short code.
    ///
    /// The mapping key holds only the record id and redirects into the
    /// byId family, so there is a single cached representation of each
    /// record. The `status` filter applies to the store query; callers
    /// that must not see inactive records check the returned status,
    /// which also covers cached hits.
    pub async fn resolve_code(
        &self,
        code: &ShortCode,
        status: Option<UrlStatus>,
    ) -> Result<Option<UrlRecord>> {
        let mapping_key = keys::code_mapping(code);

        if let Some(id) = self.cache_get::<UrlId>(&mapping_key).await {
            match self.get_by_id(id).await? {
                Some(record) => return Ok(Some(record)),
                None => {
                    // The mapping outlived its record; drop it and fall
                    // through to the store.
                    warn!(code = %code, id, "discarding stale short-code mapping");
                    self.cache_delete(&[mapping_key.clone()]).await;
                }
            }
        }

        trace!(code = %code, "short code not mapped, reading store");
        let Some(record) = self.store.find_by_short_code(code, status).await? else {
            return Ok(None);
        };
        self.cache_set(&mapping_key, &record.id, self.ttls.mapping)
            .await;
        self.cache_set(&keys::url_by_id(record.id), &record, self.ttls.url)
            .await;
        Ok(Some(record))
    }

    /// Read-through lookup of a user's records.
    pub async fn list_by_user(&self, user: Uuid) -> Result<Vec<UrlRecord>> {
        let key = keys::user_urls(user);
        if let Some(records) = self.cache_get::<Vec<UrlRecord>>(&key).await {
            return Ok(records);
        }

        trace!(user = %user, "user list not cached, reading store");
        let records = self.store.list_by_owner(user).await?;
        self.cache_set(&key, &records, self.ttls.user_list).await;
        Ok(records)
    }

    /// Drops the cached record list of an owner. Anonymous records have
    /// no list to invalidate.
    pub async fn invalidate_owner_list(&self, owner: &Owner) {
        if let Owner::User(user) = owner {
            self.cache_delete(&[keys::user_urls(*user)]).await;
        }
    }

    /// Structural invalidation after an update or delete: removes every
    /// key derived from the record in one multi-delete, then the owner
    /// list. The next read repopulates from the store.
    pub async fn purge(&self, record: &UrlRecord) {
        let derived = vec![
            keys::url_by_id(record.id),
            keys::code_mapping(&record.short_code),
            keys::clicks(&record.short_code),
        ];
        self.cache_delete(&derived).await;
        self.invalidate_owner_list(&record.owner).await;
    }

    /// Durable click increment followed by a force refresh, so reads see
    /// the new count immediately instead of after TTL expiry. Also bumps
    /// the best-effort click counter key. Returns the fresh record, or
    /// `None` when it vanished concurrently.
    pub async fn apply_click(&self, id: UrlId) -> Result<Option<UrlRecord>> {
        self.store.increment_clicks(id).await?;

        let Some(fresh) = self.refresh(id).await? else {
            return Ok(None);
        };
        self.cache_increment(&keys::clicks(&fresh.short_code), self.ttls.clicks)
            .await;
        self.invalidate_owner_list(&fresh.owner).await;
        Ok(Some(fresh))
    }

    /// Durable status write followed by a force refresh. Returns the
    /// fresh record, or `None` when it vanished concurrently.
    pub async fn apply_status(&self, id: UrlId, status: UrlStatus) -> Result<Option<UrlRecord>> {
        self.store.set_status(id, status).await?;

        let Some(fresh) = self.refresh(id).await? else {
            return Ok(None);
        };
        self.invalidate_owner_list(&fresh.owner).await;
        Ok(Some(fresh))
    }

    /// Force refresh from the store: reads the current row and
    /// overwrites the record and mapping keys with full TTLs. When the
    /// record is gone the id key is dropped instead; a surviving mapping
    /// is caught by the stale-mapping check in [`resolve_code`].
    ///
    /// [`resolve_code`]: CacheEngine::resolve_code
    pub async fn refresh(&self, id: UrlId) -> Result<Option<UrlRecord>> {
        match self.store.find_by_id(id).await? {
            Some(record) => {
                self.cache_set(&keys::url_by_id(id), &record, self.ttls.url)
                    .await;
                self.cache_set(
                    &keys::code_mapping(&record.short_code),
                    &record.id,
                    self.ttls.mapping,
                )
                .await;
                Ok(Some(record))
            }
            None => {
                self.cache_delete(&[keys::url_by_id(id)]).await;
                Ok(None)
            }
        }
    }

    /// Runs one cache operation under the engine timeout, flattening an
    /// elapsed deadline into a cache error.
    async fn bounded<T>(&self, op: impl Future<Output = CacheResult<T>>) -> CacheResult<T> {
        match tokio::time::timeout(self.cache_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(format!(
                "cache operation exceeded {:?}",
                self.cache_timeout
            ))),
        }
    }

    async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.bounded(self.cache.get(key)).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key = %key, "cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "dropping corrupted cache entry");
                    let _ = self.bounded(self.cache.delete(&[key.to_owned()])).await;
                    None
                }
            },
            Ok(None) => {
                trace!(key = %key, "cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    async fn cache_set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(key = %key, error = %e, "cache serialization failed, skipping write");
                return;
            }
        };
        if let Err(e) = self.bounded(self.cache.set(key, &payload, Some(ttl))).await {
            warn!(key = %key, error = %e, "cache write failed, continuing without it");
        }
    }

    async fn cache_delete(&self, cache_keys: &[String]) {
        if let Err(e) = self.bounded(self.cache.delete(cache_keys)).await {
            warn!(error = %e, "cache invalidation failed, entries will expire by ttl");
        }
    }

    async fn cache_increment(&self, key: &str, ttl: Duration) {
        if let Err(e) = self.bounded(self.cache.increment(key, 1, Some(ttl))).await {
            warn!(key = %key, error = %e, "counter increment failed, store count stays authoritative");
        }
    }
}

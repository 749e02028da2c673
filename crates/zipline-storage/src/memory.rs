use async_trait::async_trait;
use dashmap::DashMap;
use jiff::Timestamp;
use std::sync::atomic::{AtomicI64, Ordering};
use uuid::Uuid;
use zipline_core::store::Result;
use zipline_core::{
    base62, NewUrl, Owner, ShortCode, StoreError, UrlId, UrlRecord, UrlStatus, UrlStore, UrlUpdate,
};

/// In-memory implementation of the store contract using DashMap.
///
/// DashMap provides better concurrency than RwLock<HashMap> because it
/// uses sharded locks, allowing concurrent reads and writes to different
/// buckets without blocking. Ids come from an atomic sequence, so the
/// backend behaves like the MySQL auto-increment column.
#[derive(Debug)]
pub struct InMemoryStore {
    storage: DashMap<UrlId, UrlRecord>,
    next_id: AtomicI64,
}

impl InMemoryStore {
    /// Creates a new in-memory store.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// Creates a new in-memory store with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
            next_id: AtomicI64::new(1),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlStore for InMemoryStore {
    async fn find_by_id(&self, id: UrlId) -> Result<Option<UrlRecord>> {
        Ok(self.storage.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_short_code(
        &self,
        code: &ShortCode,
        status: Option<UrlStatus>,
    ) -> Result<Option<UrlRecord>> {
        // The short code is the base62 encoding of the id, so the lookup
        // decodes instead of scanning. A non-canonical spelling ("07")
        // decodes to an id whose record carries a different code.
        let Ok(id) = base62::decode(code.as_str()) else {
            return Ok(None);
        };
        let Some(record) = self.storage.get(&id) else {
            return Ok(None);
        };
        if record.short_code != *code {
            return Ok(None);
        }
        if let Some(wanted) = status {
            if record.status != wanted {
                return Ok(None);
            }
        }
        Ok(Some(record.clone()))
    }

    async fn find_by_owner_and_url(
        &self,
        owner: &Owner,
        original_url: &str,
    ) -> Result<Option<UrlRecord>> {
        let mut matches: Vec<UrlRecord> = self
            .storage
            .iter()
            .filter(|entry| entry.owner == *owner && entry.original_url == original_url)
            .map(|entry| entry.clone())
            .collect();
        // Earliest record wins when duplicates slipped in concurrently.
        matches.sort_by_key(|record| record.id);
        Ok(matches.into_iter().next())
    }

    async fn list_by_owner(&self, user: Uuid) -> Result<Vec<UrlRecord>> {
        let mut records: Vec<UrlRecord> = self
            .storage
            .iter()
            .filter(|entry| entry.owner == Owner::User(user))
            .map(|entry| entry.clone())
            .collect();
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn insert(&self, new_url: NewUrl) -> Result<UrlRecord> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let short_code =
            base62::encode(id).map_err(|e| StoreError::InvalidData(e.to_string()))?;
        let record = UrlRecord {
            id,
            short_code,
            original_url: new_url.original_url,
            owner: new_url.owner,
            clicks: 0,
            status: new_url.status,
            created_at: Timestamp::now(),
        };
        self.storage.insert(id, record.clone());
        Ok(record)
    }

    async fn increment_clicks(&self, id: UrlId) -> Result<()> {
        if let Some(mut record) = self.storage.get_mut(&id) {
            record.clicks += 1;
        }
        Ok(())
    }

    async fn set_status(&self, id: UrlId, status: UrlStatus) -> Result<()> {
        if let Some(mut record) = self.storage.get_mut(&id) {
            record.status = status;
        }
        Ok(())
    }

    async fn update_fields(&self, id: UrlId, update: UrlUpdate) -> Result<Option<UrlRecord>> {
        let Some(mut record) = self.storage.get_mut(&id) else {
            return Ok(None);
        };
        record.original_url = update.original_url;
        Ok(Some(record.clone()))
    }

    async fn delete_by_id(&self, id: UrlId) -> Result<bool> {
        Ok(self.storage.remove(&id).is_some())
    }
}

use crate::engine::CacheEngine;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;
use zipline_core::{
    CacheTtls, KvCache, NewUrl, Owner, ServiceError, ShortCode, UrlId, UrlRecord, UrlStatus,
    UrlStore, UrlUpdate,
};

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Longest accepted original URL, matching the store's column width.
pub const MAX_URL_LENGTH: usize = 2048;

/// Who may read and mutate records that have no owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnonymousAccess {
    /// Anonymous records are visible to anonymous callers only.
    #[default]
    AnonymousOnly,
    /// Anonymous records are visible to every caller.
    AnyCaller,
}

/// The URL shortening service.
///
/// Wraps a [`CacheEngine`] and adds the business rules on top of it:
/// - URL validation (scheme, host, length)
/// - per-owner deduplication on create
/// - ownership checks on reads and mutations
/// - identical not-found answers for missing and inactive codes
///
/// Mutations verify ownership against a fresh store read so a stale
/// cached snapshot can never authorize a write. Reads may check the
/// cached snapshot, since ownership never changes after create.
pub struct UrlService<S: ?Sized, C: ?Sized> {
    engine: CacheEngine<S, C>,
    anonymous_access: AnonymousAccess,
}

impl<S: ?Sized, C: ?Sized> Clone for UrlService<S, C> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            anonymous_access: self.anonymous_access,
        }
    }
}

impl<S, C> UrlService<S, C>
where
    S: UrlStore + ?Sized,
    C: KvCache + ?Sized,
{
    /// Creates a service over shared store and cache handles with
    /// default TTLs and the default anonymous-access policy.
    pub fn new(store: Arc<S>, cache: Arc<C>) -> Self {
        Self::with_engine(CacheEngine::new(store, cache, CacheTtls::default()))
    }

    /// Creates a service over a preconfigured engine.
    pub fn with_engine(engine: CacheEngine<S, C>) -> Self {
        Self {
            engine,
            anonymous_access: AnonymousAccess::default(),
        }
    }

    /// Overrides the anonymous-access policy.
    pub fn with_anonymous_access(mut self, policy: AnonymousAccess) -> Self {
        self.anonymous_access = policy;
        self
    }

    /// Returns the underlying cache engine.
    pub fn engine(&self) -> &CacheEngine<S, C> {
        &self.engine
    }

    /// Shortens a URL for `caller`. When the caller already shortened the
    /// same URL the existing record is returned instead of minting a new
    /// code.
    pub async fn create(&self, original_url: &str, caller: &Owner) -> Result<UrlRecord> {
        Self::validate_url(original_url)?;

        if let Some(existing) = self
            .engine
            .store()
            .find_by_owner_and_url(caller, original_url)
            .await?
        {
            debug!(id = existing.id, owner = %caller, "reusing existing record for url");
            return Ok(existing);
        }

        let record = self
            .engine
            .store()
            .insert(NewUrl::new(original_url, *caller))
            .await?;
        info!(id = record.id, code = %record.short_code, owner = %caller, "shortened url");

        self.engine.invalidate_owner_list(caller).await;
        Ok(record)
    }

    /// Fetches a record by id, read-through.
    pub async fn get_by_id(&self, id: UrlId, caller: &Owner) -> Result<UrlRecord> {
        let record = self
            .engine
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found_id(id))?;
        self.check_access(&record, caller)?;
        Ok(record)
    }

    /// Fetches a record by short code, read-through. Inactive records are
    /// returned; this is the management view, not the redirect path.
    pub async fn get_by_short_code(&self, code: &ShortCode, caller: &Owner) -> Result<UrlRecord> {
        let record = self
            .engine
            .resolve_code(code, None)
            .await?
            .ok_or_else(|| not_found_code(code))?;
        self.check_access(&record, caller)?;
        Ok(record)
    }

    /// Lists the caller's records, read-through, newest last.
    pub async fn list_by_user(&self, user: Uuid) -> Result<Vec<UrlRecord>> {
        Ok(self.engine.list_by_user(user).await?)
    }

    /// Rewrites the original URL of a record. The short code is
    /// unchanged; cached state is invalidated so the next read sees the
    /// new target.
    pub async fn update_by_id(
        &self,
        id: UrlId,
        original_url: &str,
        caller: &Owner,
    ) -> Result<UrlRecord> {
        Self::validate_url(original_url)?;

        let current = self
            .engine
            .store()
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_id(id))?;
        self.check_access(&current, caller)?;

        let updated = self
            .engine
            .store()
            .update_fields(
                id,
                UrlUpdate {
                    original_url: original_url.to_owned(),
                },
            )
            .await?
            .ok_or_else(|| not_found_id(id))?;
        info!(id, "updated url target");

        self.engine.purge(&updated).await;
        Ok(updated)
    }

    /// Activates or deactivates a record, then force-refreshes the cache
    /// so the redirect path observes the change immediately.
    pub async fn set_status(
        &self,
        id: UrlId,
        status: UrlStatus,
        caller: &Owner,
    ) -> Result<UrlRecord> {
        let current = self
            .engine
            .store()
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_id(id))?;
        self.check_access(&current, caller)?;

        let fresh = self
            .engine
            .apply_status(id, status)
            .await?
            .ok_or_else(|| not_found_id(id))?;
        info!(id, status = %status, "updated url status");
        Ok(fresh)
    }

    /// Removes a record by id and purges every cache key derived from it.
    pub async fn delete_by_id(&self, id: UrlId, caller: &Owner) -> Result<()> {
        let record = self
            .engine
            .store()
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found_id(id))?;
        self.check_access(&record, caller)?;

        if !self.engine.store().delete_by_id(id).await? {
            return Err(not_found_id(id));
        }
        info!(id, code = %record.short_code, "deleted url");

        self.engine.purge(&record).await;
        Ok(())
    }

    /// Removes a record by short code and purges every cache key derived
    /// from it.
    pub async fn delete_by_short_code(&self, code: &ShortCode, caller: &Owner) -> Result<()> {
        let record = self
            .engine
            .store()
            .find_by_short_code(code, None)
            .await?
            .ok_or_else(|| not_found_code(code))?;
        self.check_access(&record, caller)?;

        if !self.engine.store().delete_by_id(record.id).await? {
            return Err(not_found_code(code));
        }
        info!(id = record.id, code = %code, "deleted url");

        self.engine.purge(&record).await;
        Ok(())
    }

    /// Records one click against a record. No ownership check: clicks
    /// come from the public redirect path.
    pub async fn increment_clicks(&self, id: UrlId) -> Result<UrlRecord> {
        self.engine
            .apply_click(id)
            .await?
            .ok_or_else(|| not_found_id(id))
    }

    /// Resolves a short code for redirection and counts the click.
    /// Returns the original URL. Inactive and unknown codes are
    /// indistinguishable to the caller.
    pub async fn resolve_and_increment(&self, code: &ShortCode) -> Result<String> {
        let record = self
            .engine
            .resolve_code(code, Some(UrlStatus::Active))
            .await?
            .ok_or_else(|| not_found_code(code))?;

        // A cached hit bypasses the store's status filter.
        if !record.status.is_active() {
            return Err(not_found_code(code));
        }

        let fresh = self
            .engine
            .apply_click(record.id)
            .await?
            .ok_or_else(|| not_found_code(code))?;
        debug!(code = %code, clicks = fresh.clicks, "resolved redirect");
        Ok(fresh.original_url)
    }

    /// Validates that `url` is a well-formed http(s) URL with a host and
    /// fits the store.
    fn validate_url(url: &str) -> Result<()> {
        if url.is_empty() {
            return Err(ServiceError::InvalidArgument(
                "url must not be empty".to_string(),
            ));
        }
        if url.len() > MAX_URL_LENGTH {
            return Err(ServiceError::InvalidArgument(format!(
                "url exceeds {} bytes",
                MAX_URL_LENGTH
            )));
        }

        let parsed = Url::parse(url)
            .map_err(|e| ServiceError::InvalidArgument(format!("malformed url: {}", e)))?;
        match parsed.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(ServiceError::InvalidArgument(format!(
                    "url scheme must be http or https, got '{}'",
                    scheme
                )));
            }
        }
        if parsed.host_str().is_none() {
            return Err(ServiceError::InvalidArgument(
                "url must have a host".to_string(),
            ));
        }
        Ok(())
    }

    fn check_access(&self, record: &UrlRecord, caller: &Owner) -> Result<()> {
        match (&record.owner, caller) {
            (Owner::User(owner), Owner::User(user)) if owner == user => Ok(()),
            (Owner::User(_), _) => Err(ServiceError::Unauthorized(
                "record belongs to another user".to_string(),
            )),
            (Owner::Anonymous, Owner::Anonymous) => Ok(()),
            (Owner::Anonymous, Owner::User(_)) => match self.anonymous_access {
                AnonymousAccess::AnyCaller => Ok(()),
                AnonymousAccess::AnonymousOnly => Err(ServiceError::Unauthorized(
                    "anonymous records are not tied to an account".to_string(),
                )),
            },
        }
    }
}

/// Not-found answer for an id lookup.
fn not_found_id(id: UrlId) -> ServiceError {
    ServiceError::NotFound(format!("url {}", id))
}

/// Not-found answer for a code lookup. Used for missing and inactive
/// codes alike so callers cannot probe which one it was.
fn not_found_code(code: &ShortCode) -> ServiceError {
    ServiceError::NotFound(format!("short code '{}'", code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zipline_cache::MemoryCache;
    use zipline_storage::InMemoryStore;

    fn test_service() -> UrlService<InMemoryStore, MemoryCache> {
        UrlService::new(Arc::new(InMemoryStore::new()), Arc::new(MemoryCache::new()))
    }

    fn user() -> Owner {
        Owner::User(Uuid::new_v4())
    }

    #[tokio::test]
    async fn create_returns_a_resolvable_record() {
        let service = test_service();
        let caller = user();

        let record = service
            .create("https://example.com/page", &caller)
            .await
            .unwrap();
        assert_eq!(record.original_url, "https://example.com/page");
        assert_eq!(record.clicks, 0);
        assert_eq!(record.status, UrlStatus::Active);

        let found = service
            .get_by_short_code(&record.short_code, &caller)
            .await
            .unwrap();
        assert_eq!(found.id, record.id);
    }

    #[tokio::test]
    async fn create_deduplicates_per_owner() {
        let service = test_service();
        let caller = user();

        let first = service
            .create("https://example.com", &caller)
            .await
            .unwrap();
        let second = service
            .create("https://example.com", &caller)
            .await
            .unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.short_code, second.short_code);
    }

    #[tokio::test]
    async fn create_mints_distinct_codes_per_owner() {
        let service = test_service();

        let a = service
            .create("https://example.com", &user())
            .await
            .unwrap();
        let b = service
            .create("https://example.com", &user())
            .await
            .unwrap();
        let anon = service
            .create("https://example.com", &Owner::Anonymous)
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_ne!(a.id, anon.id);
        assert_ne!(b.short_code, anon.short_code);
    }

    #[tokio::test]
    async fn create_rejects_invalid_urls() {
        let service = test_service();
        let caller = user();

        for bad in [
            "",
            "not a url",
            "ftp://example.com/file",
            "http://",
            "example.com/missing-scheme",
        ] {
            let err = service.create(bad, &caller).await.unwrap_err();
            assert!(
                matches!(err, ServiceError::InvalidArgument(_)),
                "{:?} accepted {:?}",
                err,
                bad
            );
        }

        let oversized = format!("https://example.com/{}", "a".repeat(MAX_URL_LENGTH));
        let err = service.create(&oversized, &caller).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn owned_records_reject_other_callers() {
        let service = test_service();
        let owner = user();
        let record = service.create("https://example.com", &owner).await.unwrap();

        let err = service.get_by_id(record.id, &user()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = service
            .get_by_id(record.id, &Owner::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = service
            .delete_by_id(record.id, &Owner::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        assert!(service.get_by_id(record.id, &owner).await.is_ok());
    }

    #[tokio::test]
    async fn anonymous_records_follow_the_access_policy() {
        let service = test_service();
        let record = service
            .create("https://example.com", &Owner::Anonymous)
            .await
            .unwrap();

        // Default policy: anonymous callers only.
        assert!(service.get_by_id(record.id, &Owner::Anonymous).await.is_ok());
        let err = service.get_by_id(record.id, &user()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let open = test_service().with_anonymous_access(AnonymousAccess::AnyCaller);
        let record = open
            .create("https://example.com", &Owner::Anonymous)
            .await
            .unwrap();
        assert!(open.get_by_id(record.id, &user()).await.is_ok());
    }

    #[tokio::test]
    async fn missing_and_inactive_codes_are_indistinguishable() {
        let service = test_service();
        let caller = user();
        let record = service.create("https://example.com", &caller).await.unwrap();

        service
            .set_status(record.id, UrlStatus::Inactive, &caller)
            .await
            .unwrap();
        let inactive_err = service
            .resolve_and_increment(&record.short_code)
            .await
            .unwrap_err();
        assert!(matches!(inactive_err, ServiceError::NotFound(_)));

        service.delete_by_id(record.id, &caller).await.unwrap();
        let missing_err = service
            .resolve_and_increment(&record.short_code)
            .await
            .unwrap_err();

        assert_eq!(inactive_err.to_string(), missing_err.to_string());
    }

    #[tokio::test]
    async fn resolve_and_increment_returns_target_and_counts() {
        let service = test_service();
        let caller = user();
        let record = service
            .create("https://example.com/target", &caller)
            .await
            .unwrap();

        let target = service
            .resolve_and_increment(&record.short_code)
            .await
            .unwrap();
        assert_eq!(target, "https://example.com/target");

        let found = service.get_by_id(record.id, &caller).await.unwrap();
        assert_eq!(found.clicks, 1);
    }

    #[tokio::test]
    async fn redirects_need_no_ownership() {
        let service = test_service();
        let record = service
            .create("https://example.com", &user())
            .await
            .unwrap();

        // The redirect path never sees a caller identity.
        assert!(service
            .resolve_and_increment(&record.short_code)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn reactivation_restores_redirects_and_keeps_counts() {
        let service = test_service();
        let caller = user();
        let record = service.create("https://example.com", &caller).await.unwrap();

        service
            .resolve_and_increment(&record.short_code)
            .await
            .unwrap();
        service
            .set_status(record.id, UrlStatus::Inactive, &caller)
            .await
            .unwrap();
        assert!(service
            .resolve_and_increment(&record.short_code)
            .await
            .is_err());

        service
            .set_status(record.id, UrlStatus::Active, &caller)
            .await
            .unwrap();
        service
            .resolve_and_increment(&record.short_code)
            .await
            .unwrap();

        let found = service.get_by_id(record.id, &caller).await.unwrap();
        assert_eq!(found.clicks, 2);
    }

    #[tokio::test]
    async fn inactive_records_stay_visible_to_their_owner() {
        let service = test_service();
        let caller = user();
        let record = service.create("https://example.com", &caller).await.unwrap();

        service
            .set_status(record.id, UrlStatus::Inactive, &caller)
            .await
            .unwrap();

        let found = service
            .get_by_short_code(&record.short_code, &caller)
            .await
            .unwrap();
        assert_eq!(found.status, UrlStatus::Inactive);
    }

    #[tokio::test]
    async fn update_changes_the_target() {
        let service = test_service();
        let caller = user();
        let record = service
            .create("https://example.com/old", &caller)
            .await
            .unwrap();

        let updated = service
            .update_by_id(record.id, "https://example.com/new", &caller)
            .await
            .unwrap();
        assert_eq!(updated.original_url, "https://example.com/new");
        assert_eq!(updated.short_code, record.short_code);

        let target = service
            .resolve_and_increment(&record.short_code)
            .await
            .unwrap();
        assert_eq!(target, "https://example.com/new");
    }

    #[tokio::test]
    async fn delete_by_code_removes_the_record() {
        let service = test_service();
        let caller = user();
        let record = service.create("https://example.com", &caller).await.unwrap();

        service
            .delete_by_short_code(&record.short_code, &caller)
            .await
            .unwrap();

        let err = service.get_by_id(record.id, &caller).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_by_user_shows_only_their_records() {
        let service = test_service();
        let user_id = Uuid::new_v4();
        let caller = Owner::User(user_id);

        service
            .create("https://example.com/a", &caller)
            .await
            .unwrap();
        service
            .create("https://example.com/b", &caller)
            .await
            .unwrap();
        service
            .create("https://example.com/other", &user())
            .await
            .unwrap();
        service
            .create("https://example.com/anon", &Owner::Anonymous)
            .await
            .unwrap();

        let listed = service.list_by_user(user_id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|r| r.owner == caller));
    }

    #[tokio::test]
    async fn listing_reflects_creates_and_deletes() {
        let service = test_service();
        let user_id = Uuid::new_v4();
        let caller = Owner::User(user_id);

        let record = service
            .create("https://example.com/a", &caller)
            .await
            .unwrap();
        assert_eq!(service.list_by_user(user_id).await.unwrap().len(), 1);

        service
            .create("https://example.com/b", &caller)
            .await
            .unwrap();
        assert_eq!(service.list_by_user(user_id).await.unwrap().len(), 2);

        service.delete_by_id(record.id, &caller).await.unwrap();
        assert_eq!(service.list_by_user(user_id).await.unwrap().len(), 1);
    }
}

use crate::error::StoreError;
use crate::record::{Owner, UrlId, UrlRecord, UrlStatus};
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Parameters for creating a URL record.
///
/// The store assigns the id, derives the short code from it, zeroes the
/// click count, and stamps the creation time.
#[derive(Debug, Clone)]
pub struct NewUrl {
    pub original_url: String,
    pub owner: Owner,
    pub status: UrlStatus,
}

impl NewUrl {
    /// A new record in the active state.
    pub fn new(original_url: impl Into<String>, owner: Owner) -> Self {
        Self {
            original_url: original_url.into(),
            owner,
            status: UrlStatus::Active,
        }
    }
}

/// Replaceable fields of an existing URL record.
#[derive(Debug, Clone)]
pub struct UrlUpdate {
    pub original_url: String,
}

/// The durable source of truth for URL records.
#[async_trait]
pub trait UrlStore: Send + Sync + 'static {
    /// Looks up a record by id.
    async fn find_by_id(&self, id: UrlId) -> Result<Option<UrlRecord>>;

    /// Looks up a record by short code, optionally restricted to records
    /// in the given status.
    async fn find_by_short_code(
        &self,
        code: &ShortCode,
        status: Option<UrlStatus>,
    ) -> Result<Option<UrlRecord>>;

    /// De-duplication probe: the record this owner already created for
    /// this exact URL, keyed `(original_url, owner)`.
    async fn find_by_owner_and_url(
        &self,
        owner: &Owner,
        original_url: &str,
    ) -> Result<Option<UrlRecord>>;

    /// All records belonging to a user, ordered by ascending id.
    async fn list_by_owner(&self, user: Uuid) -> Result<Vec<UrlRecord>>;

    /// Inserts a new record and returns it fully populated.
    async fn insert(&self, new_url: NewUrl) -> Result<UrlRecord>;

    /// Atomically bumps the click counter of an existing record.
    async fn increment_clicks(&self, id: UrlId) -> Result<()>;

    /// Writes a new status for an existing record.
    async fn set_status(&self, id: UrlId, status: UrlStatus) -> Result<()>;

    /// Replaces the mutable fields of a record, returning the updated
    /// record, or `None` when no record has this id.
    async fn update_fields(&self, id: UrlId, update: UrlUpdate) -> Result<Option<UrlRecord>>;

    /// Removes a record. Returns `true` if it existed.
    async fn delete_by_id(&self, id: UrlId) -> Result<bool>;
}

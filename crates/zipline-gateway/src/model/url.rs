use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zipline_core::{UrlId, UrlRecord, UrlStatus};

#[derive(Debug, Deserialize)]
pub struct CreateUrlRequest {
    pub original_url: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUrlRequest {
    pub original_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: UrlStatus,
}

/// Wire form of a URL record, with the short link rendered against the
/// public base URL.
#[derive(Debug, Serialize)]
pub struct UrlResponse {
    pub id: UrlId,
    pub short_code: String,
    pub short_url: String,
    pub original_url: String,
    pub user_id: Option<Uuid>,
    pub clicks: u64,
    pub status: UrlStatus,
    pub created_at: Timestamp,
}

impl UrlResponse {
    pub fn from_record(record: UrlRecord, base_url: &str) -> Self {
        Self {
            short_url: record.short_code.to_url(base_url),
            short_code: record.short_code.to_string(),
            id: record.id,
            original_url: record.original_url,
            user_id: record.owner.user_id(),
            clicks: record.clicks,
            status: record.status,
            created_at: record.created_at,
        }
    }
}

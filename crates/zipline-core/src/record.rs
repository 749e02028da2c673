use crate::error::ServiceError;
use crate::shortcode::ShortCode;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use uuid::Uuid;

/// Identifier assigned to a URL record by the durable store.
pub type UrlId = i64;

/// Publication state of a shortened URL.
///
/// Inactive URLs stay visible to their owner but no longer redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlStatus {
    Active,
    Inactive,
}

impl UrlStatus {
    pub fn is_active(self) -> bool {
        matches!(self, UrlStatus::Active)
    }

    /// Canonical lowercase name, as stored and serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            UrlStatus::Active => "active",
            UrlStatus::Inactive => "inactive",
        }
    }
}

impl Display for UrlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UrlStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UrlStatus::Active),
            "inactive" => Ok(UrlStatus::Inactive),
            other => Err(ServiceError::InvalidArgument(format!(
                "unknown url status: '{other}'"
            ))),
        }
    }
}

/// The party a URL record belongs to, or the party making a request.
///
/// Serializes untagged: a user as its UUID string, anonymous as null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Owner {
    /// An authenticated user, identified by UUID.
    User(Uuid),
    /// No authenticated user.
    Anonymous,
}

impl Owner {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Owner::User(id) => Some(*id),
            Owner::Anonymous => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Owner::Anonymous)
    }
}

impl From<Option<Uuid>> for Owner {
    fn from(id: Option<Uuid>) -> Self {
        match id {
            Some(id) => Owner::User(id),
            None => Owner::Anonymous,
        }
    }
}

impl Display for Owner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Owner::User(id) => write!(f, "{id}"),
            Owner::Anonymous => f.write_str("anonymous"),
        }
    }
}

/// One canonical URL record, shared unchanged by the store, the cache,
/// and the service layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    /// Store-assigned identifier.
    pub id: UrlId,
    /// Base62 encoding of `id`.
    pub short_code: ShortCode,
    /// The destination URL.
    pub original_url: String,
    pub owner: Owner,
    /// Authoritative click count from the store at read time.
    pub clicks: u64,
    pub status: UrlStatus,
    pub created_at: Timestamp,
}

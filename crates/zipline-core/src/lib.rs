//! Core types and contracts for the zipline URL shortener.
//!
//! This crate defines the canonical URL record, the base62 short-code
//! codec, and the store and cache contracts shared by the storage,
//! service, and gateway crates.

pub mod base62;
pub mod cache;
pub mod error;
pub mod record;
pub mod shortcode;
pub mod store;

pub use cache::{CacheTtls, KvCache};
pub use error::{CacheError, ServiceError, StoreError};
pub use record::{Owner, UrlId, UrlRecord, UrlStatus};
pub use shortcode::ShortCode;
pub use store::{NewUrl, UrlStore, UrlUpdate};

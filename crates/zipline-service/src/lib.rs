//! The zipline service layer.
//!
//! [`CacheEngine`] owns the cache-consistency policy (read-through,
//! write-invalidate, force-refresh-from-store) over any store and cache
//! backend pair. [`UrlService`] layers validation, de-duplication, and
//! ownership checks on top of it.

pub mod engine;
pub mod service;

pub use engine::CacheEngine;
pub use service::{AnonymousAccess, UrlService};

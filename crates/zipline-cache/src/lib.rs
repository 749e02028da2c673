//! Cache backends for zipline.
//!
//! All backends implement the [`KvCache`] contract from `zipline-core`:
//! an in-process [`MemoryCache`], a Redis-backed [`RedisCache`], and a
//! [`NoopCache`] for cache-disabled deployments.
//!
//! [`KvCache`]: zipline_core::KvCache

pub mod memory;
pub mod noop;
pub mod redis;

pub use memory::MemoryCache;
pub use noop::NoopCache;
pub use self::redis::RedisCache;

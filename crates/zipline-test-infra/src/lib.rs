//! Disposable container fixtures for zipline integration tests.
//!
//! Each fixture starts a throwaway container and exposes the connection
//! details the sqlx and redis clients expect. Callers own the fixture
//! for the lifetime of the test; dropping it tears the container down.

pub mod error;
pub mod mysql;
pub mod redis;

pub use error::{Result, TestInfraError};
pub use mysql::{MySqlServer, MysqlConfig};
pub use self::redis::RedisServer;

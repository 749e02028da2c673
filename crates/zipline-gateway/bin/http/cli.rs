use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;
use zipline_core::CacheTtls;

pub const LISTEN_ADDR_ENV: &str = "ZIPLINE_GATEWAY_LISTEN_ADDR";
pub const BASE_URL_ENV: &str = "ZIPLINE_GATEWAY_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "ZIPLINE_GATEWAY_STORAGE_BACKEND";
pub const MYSQL_URL_ENV: &str = "ZIPLINE_GATEWAY_MYSQL_URL";
pub const CACHE_BACKEND_ENV: &str = "ZIPLINE_GATEWAY_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "ZIPLINE_GATEWAY_REDIS_URL";
pub const URL_TTL_ENV: &str = "ZIPLINE_GATEWAY_URL_TTL_SECS";
pub const MAPPING_TTL_ENV: &str = "ZIPLINE_GATEWAY_MAPPING_TTL_SECS";
pub const USER_TTL_ENV: &str = "ZIPLINE_GATEWAY_USER_TTL_SECS";
pub const CLICKS_TTL_ENV: &str = "ZIPLINE_GATEWAY_CLICKS_TTL_SECS";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
    #[value(name = "disabled")]
    Disabled,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::InMemory => write!(f, "in-memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
            CacheBackendArg::Disabled => write!(f, "disabled"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "zipline-gateway-http-server")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Public base URL short links are rendered against.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_URL_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_url: Option<String>,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::InMemory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    /// Seconds a cached record stays live.
    #[arg(long, env = URL_TTL_ENV, default_value_t = 3600)]
    pub url_ttl_secs: u64,

    /// Seconds a cached short-code mapping stays live.
    #[arg(long, env = MAPPING_TTL_ENV, default_value_t = 7200)]
    pub mapping_ttl_secs: u64,

    /// Seconds a cached per-user listing stays live.
    #[arg(long, env = USER_TTL_ENV, default_value_t = 3600)]
    pub user_ttl_secs: u64,

    /// Seconds a click counter stays live.
    #[arg(long, env = CLICKS_TTL_ENV, default_value_t = 86400)]
    pub clicks_ttl_secs: u64,
}

impl CLI {
    pub fn ttls(&self) -> CacheTtls {
        CacheTtls::builder()
            .url(Duration::from_secs(self.url_ttl_secs))
            .mapping(Duration::from_secs(self.mapping_ttl_secs))
            .user_list(Duration::from_secs(self.user_ttl_secs))
            .clicks(Duration::from_secs(self.clicks_ttl_secs))
            .build()
    }
}

//! Store backends for zipline.
//!
//! Both backends implement the [`UrlStore`] contract from `zipline-core`:
//! a DashMap-backed [`InMemoryStore`] and a sqlx-backed [`MySqlStore`]
//! (schema under `ddl/mysql/`).
//!
//! [`UrlStore`]: zipline_core::UrlStore

pub mod memory;
pub mod mysql;

pub use memory::InMemoryStore;
pub use mysql::MySqlStore;

//! # kabu-cache
//!
//! `Cache` 端口的两个实现：进程内的 `MemCache` 与落盘的 `SqliteCache`。

pub mod mem;
pub mod sqlite;

pub use mem::MemCache;
pub use sqlite::SqliteCache;

//! # kabu-feed
//!
//! `MarketDataProvider` 的实现：东方财富 (估值取自雪球) HTTP 数据源、本地 JSON 数据源，
//! 以及为任意数据源加上 TTL 缓存的装饰器。

pub mod cached;
pub mod eastmoney;
pub mod fixture;
pub mod xueqiu;

pub use cached::{CachedProvider, CacheTtls};
pub use eastmoney::EastmoneyProvider;
pub use fixture::FixtureProvider;

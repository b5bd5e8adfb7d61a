use async_trait::async_trait;
use chrono::NaiveDate;
use kabu_core::cache::port::{Cache, CacheExt, cache_key};
use kabu_core::common::{Adjustment, Stock};
use kabu_core::config::CacheConfig;
use kabu_core::market::entity::{
    FinancialReport, FundFlowEntry, PriceBar, QuoteSnapshot, ValuationSnapshot,
};
use kabu_core::market::error::MarketError;
use kabu_core::market::port::MarketDataProvider;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// # Summary
/// 按数据类别区分的缓存时长。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub realtime: Duration,
    pub daily_kline: Duration,
    pub financial: Duration,
    pub valuation: Duration,
    pub fund_flow: Duration,
}

impl From<&CacheConfig> for CacheTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            realtime: config.realtime_ttl(),
            daily_kline: config.daily_kline_ttl(),
            financial: config.financial_ttl(),
            valuation: config.valuation_ttl(),
            fund_flow: config.fund_flow_ttl(),
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

/// # Summary
/// 为任意数据源加上 TTL 缓存的装饰器。
///
/// # Invariants
/// - 只缓存非空结果，空列表、`None` 与错误均不写入缓存。
/// - 缓存读写失败只记录日志并回退到内部数据源，从不向调用方传播。
pub struct CachedProvider {
    inner: Arc<dyn MarketDataProvider>,
    cache: Arc<dyn Cache>,
    ttls: CacheTtls,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn MarketDataProvider>, cache: Arc<dyn Cache>, ttls: CacheTtls) -> Self {
        Self { inner, cache, ttls }
    }

    async fn lookup<T: DeserializeOwned + Send>(&self, key: &str, category: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(Some(value)) => {
                debug!(category, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                debug!(category, "Cache miss");
                None
            }
            Err(e) => {
                warn!(category, error = %e, "Cache read failed, bypassing");
                None
            }
        }
    }

    async fn store<T: Serialize + Send + Sync>(&self, key: &str, category: &str, value: &T, ttl: Duration) {
        if let Err(e) = self.cache.set(key, value, ttl).await {
            warn!(category, error = %e, "Cache write failed");
        }
    }
}

#[async_trait]
impl MarketDataProvider for CachedProvider {
    async fn fetch_price_series(
        &self,
        stock: &Stock,
        start: NaiveDate,
        end: NaiveDate,
        adjustment: Adjustment,
    ) -> Result<Vec<PriceBar>, MarketError> {
        let key = cache_key(
            "daily_kline",
            &[
                &stock.symbol,
                &start.format("%Y%m%d").to_string(),
                &end.format("%Y%m%d").to_string(),
                &adjustment.to_string(),
            ],
        );
        if let Some(bars) = self.lookup::<Vec<PriceBar>>(&key, "daily_kline").await {
            return Ok(bars);
        }
        let bars = self
            .inner
            .fetch_price_series(stock, start, end, adjustment)
            .await?;
        if !bars.is_empty() {
            self.store(&key, "daily_kline", &bars, self.ttls.daily_kline).await;
        }
        Ok(bars)
    }

    async fn fetch_quote_snapshot(
        &self,
        stock: &Stock,
    ) -> Result<Option<QuoteSnapshot>, MarketError> {
        let key = cache_key("realtime", &[&stock.symbol]);
        if let Some(quote) = self.lookup::<QuoteSnapshot>(&key, "realtime").await {
            return Ok(Some(quote));
        }
        let quote = self.inner.fetch_quote_snapshot(stock).await?;
        if let Some(q) = &quote {
            self.store(&key, "realtime", q, self.ttls.realtime).await;
        }
        Ok(quote)
    }

    async fn fetch_valuation_snapshot(
        &self,
        stock: &Stock,
    ) -> Result<ValuationSnapshot, MarketError> {
        let key = cache_key("valuation", &[&stock.prefixed()]);
        if let Some(snapshot) = self.lookup::<ValuationSnapshot>(&key, "valuation").await {
            return Ok(snapshot);
        }
        let snapshot = self.inner.fetch_valuation_snapshot(stock).await?;
        if !snapshot.is_empty() {
            self.store(&key, "valuation", &snapshot, self.ttls.valuation).await;
        }
        Ok(snapshot)
    }

    async fn fetch_fund_flow(
        &self,
        stock: &Stock,
    ) -> Result<Option<Vec<FundFlowEntry>>, MarketError> {
        let key = cache_key("fund_flow", &[&stock.symbol, stock.market()]);
        if let Some(entries) = self.lookup::<Vec<FundFlowEntry>>(&key, "fund_flow").await {
            return Ok(Some(entries));
        }
        let entries = self.inner.fetch_fund_flow(stock).await?;
        if let Some(e) = entries.as_ref().filter(|e| !e.is_empty()) {
            self.store(&key, "fund_flow", e, self.ttls.fund_flow).await;
        }
        Ok(entries)
    }

    async fn fetch_financial_summary(
        &self,
        stock: &Stock,
    ) -> Result<Vec<FinancialReport>, MarketError> {
        let key = cache_key("financial", &[&stock.symbol]);
        if let Some(reports) = self.lookup::<Vec<FinancialReport>>(&key, "financial").await {
            return Ok(reports);
        }
        let reports = self.inner.fetch_financial_summary(stock).await?;
        if !reports.is_empty() {
            self.store(&key, "financial", &reports, self.ttls.financial).await;
        }
        Ok(reports)
    }
}

use async_trait::async_trait;
use chrono::NaiveDate;
use kabu_core::common::{Adjustment, Stock};
use kabu_core::market::entity::{
    FinancialReport, FundFlowEntry, PriceBar, QuoteSnapshot, ValuationSnapshot,
};
use kabu_core::market::error::MarketError;
use kabu_core::market::port::MarketDataProvider;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// # Summary
/// 读取本地 JSON 文件的数据源，用于离线运行与测试。
///
/// # Invariants
/// - 目录结构为 `<root>/<代码>/{bars,quote,valuation,fund_flow,financial}.json`。
/// - 文件缺失视为数据不可用；K 线按请求的日期区间过滤，复权方式由文件内容决定。
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    root: PathBuf,
}

impl FixtureProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, stock: &Stock, name: &str) -> PathBuf {
        self.root.join(&stock.symbol).join(format!("{}.json", name))
    }

    /// # Summary
    /// 读取并反序列化单个文件。
    ///
    /// # Returns
    /// 文件不存在返回 `Ok(None)`；其余 I/O 错误返回 `MarketError::Network`，格式错误返回 `MarketError::Parse`。
    async fn load<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, MarketError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Fixture file missing");
                return Ok(None);
            }
            Err(e) => return Err(MarketError::Network(e.to_string())),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| MarketError::Parse(format!("{}: {}", path.display(), e)))
    }

    async fn require<T: DeserializeOwned>(&self, stock: &Stock, name: &str) -> Result<T, MarketError> {
        let path = self.path(stock, name);
        self.load(&path).await?.ok_or_else(|| {
            MarketError::DataUnavailable(format!("missing fixture {}", path.display()))
        })
    }
}

#[async_trait]
impl MarketDataProvider for FixtureProvider {
    async fn fetch_price_series(
        &self,
        stock: &Stock,
        start: NaiveDate,
        end: NaiveDate,
        _adjustment: Adjustment,
    ) -> Result<Vec<PriceBar>, MarketError> {
        let bars: Vec<PriceBar> = self.require(stock, "bars").await?;
        let bars: Vec<PriceBar> = bars
            .into_iter()
            .filter(|b| b.date >= start && b.date <= end)
            .collect();
        if bars.is_empty() {
            return Err(MarketError::DataUnavailable(format!(
                "no daily bars for {} between {} and {}",
                stock, start, end
            )));
        }
        Ok(bars)
    }

    async fn fetch_quote_snapshot(
        &self,
        stock: &Stock,
    ) -> Result<Option<QuoteSnapshot>, MarketError> {
        self.load(&self.path(stock, "quote")).await
    }

    async fn fetch_valuation_snapshot(
        &self,
        stock: &Stock,
    ) -> Result<ValuationSnapshot, MarketError> {
        Ok(self
            .load(&self.path(stock, "valuation"))
            .await?
            .unwrap_or_default())
    }

    async fn fetch_fund_flow(
        &self,
        stock: &Stock,
    ) -> Result<Option<Vec<FundFlowEntry>>, MarketError> {
        let entries: Option<Vec<FundFlowEntry>> = self.load(&self.path(stock, "fund_flow")).await?;
        Ok(entries.filter(|e| !e.is_empty()))
    }

    async fn fetch_financial_summary(
        &self,
        stock: &Stock,
    ) -> Result<Vec<FinancialReport>, MarketError> {
        self.require(stock, "financial").await
    }
}

use crate::common::{Adjustment, Stock};
use crate::market::entity::{
    FinancialReport, FundFlowEntry, PriceBar, QuoteSnapshot, ValuationSnapshot,
};
use crate::market::error::MarketError;
use async_trait::async_trait;
use chrono::NaiveDate;

/// # Summary
/// 市场数据提供者接口（外部数据源）。
///
/// # Invariants
/// - 实现者必须是 `Send + Sync`，以便通过 `Arc<dyn MarketDataProvider>` 注入。
/// - 返回的 K 线与资金流向均按日期升序排列。
/// - 实现者只负责搬运数据，不对数据正确性做业务校验。
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// # Summary
    /// 获取指定日期区间内的日 K 线。
    ///
    /// # Logic
    /// 1. 按复权方式构建请求。
    /// 2. 解析为升序排列的 `PriceBar` 列表。
    ///
    /// # Arguments
    /// * `stock`: 证券身份。
    /// * `start`: 开始日期 (含)。
    /// * `end`: 结束日期 (含)。
    /// * `adjustment`: 复权方式。
    ///
    /// # Returns
    /// 成功返回 K 线列表；无数据时返回 `MarketError::DataUnavailable`。
    async fn fetch_price_series(
        &self,
        stock: &Stock,
        start: NaiveDate,
        end: NaiveDate,
        adjustment: Adjustment,
    ) -> Result<Vec<PriceBar>, MarketError>;

    /// # Summary
    /// 获取实时行情快照。
    ///
    /// # Returns
    /// 找不到该证券时返回 `Ok(None)`。
    async fn fetch_quote_snapshot(&self, stock: &Stock)
    -> Result<Option<QuoteSnapshot>, MarketError>;

    /// # Summary
    /// 获取估值快照（股息率等条目）。
    ///
    /// # Returns
    /// 无数据时返回空快照。
    async fn fetch_valuation_snapshot(&self, stock: &Stock)
    -> Result<ValuationSnapshot, MarketError>;

    /// # Summary
    /// 获取逐日主力资金流向，市场标识由证券身份推导。
    ///
    /// # Returns
    /// 无数据时返回 `Ok(None)`。
    async fn fetch_fund_flow(&self, stock: &Stock)
    -> Result<Option<Vec<FundFlowEntry>>, MarketError>;

    /// # Summary
    /// 获取按报告期排列的财务摘要，最近一期在前。
    async fn fetch_financial_summary(
        &self,
        stock: &Stock,
    ) -> Result<Vec<FinancialReport>, MarketError>;
}

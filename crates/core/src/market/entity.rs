use crate::market::error::MarketError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 估值快照中股息率 (TTM) 的键名，沿用数据源返回的原始条目名。
pub const DIVIDEND_YIELD_TTM: &str = "股息率(TTM)";

/// # Summary
/// 单根日 K 线数据实体。
///
/// # Invariants
/// - 构造后不可变；同一序列中日期唯一。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    // 交易日
    pub date: NaiveDate,
    // 开盘价
    pub open: f64,
    // 最高价
    pub high: f64,
    // 最低价
    pub low: f64,
    // 收盘价
    pub close: f64,
    // 成交量
    pub volume: f64,
}

/// # Summary
/// 一次分析所使用的日线序列 (Series Store)。
///
/// # Invariants
/// - 按日期严格递增，无重复日期。
/// - 构造后只读，没有任何修改入口。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// # Summary
    /// 校验并封装日线序列。
    ///
    /// # Logic
    /// 1. 逐对检查相邻 K 线日期是否严格递增。
    /// 2. 校验通过后获取所有权并冻结。
    ///
    /// # Arguments
    /// * `bars`: 按日期升序排列的 K 线。
    ///
    /// # Returns
    /// 成功返回序列；日期乱序或重复时返回 `MarketError::InvalidSeries`。
    pub fn new(bars: Vec<PriceBar>) -> Result<Self, MarketError> {
        if let Some(pair) = bars.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(MarketError::InvalidSeries(format!(
                "bar dates must be strictly increasing: {} followed by {}",
                pair[0].date, pair[1].date
            )));
        }
        Ok(Self { bars })
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// 最新 (最后) 一根 K 线。
    pub fn latest(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    /// 收盘价列。
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// # Summary
/// 实时行情快照，估值维度读取其中的市盈率与市净率。
///
/// # Invariants
/// - 数据源缺失或无法解析的数值字段为 `None`，绝不以 0 代替。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    // 股票代码
    pub symbol: String,
    // 股票名称
    #[serde(default)]
    pub name: Option<String>,
    // 最新价
    #[serde(default)]
    pub price: Option<f64>,
    // 涨跌幅 (%)
    #[serde(default)]
    pub pct_change: Option<f64>,
    // 动态市盈率
    #[serde(default)]
    pub pe: Option<f64>,
    // 市净率
    #[serde(default)]
    pub pb: Option<f64>,
    // 总市值 (元)
    #[serde(default)]
    pub market_cap: Option<f64>,
}

/// # Summary
/// 估值快照中的单个条目值，数据源可能返回数字或文本。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValuationValue {
    Number(f64),
    Text(String),
}

/// # Summary
/// 估值快照，条目名到取值的映射。
///
/// # Invariants
/// - 仅数值条目参与评分，文本条目只用于展示。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValuationSnapshot(BTreeMap<String, ValuationValue>);

impl ValuationSnapshot {
    pub fn new(items: BTreeMap<String, ValuationValue>) -> Self {
        Self(items)
    }

    pub fn get(&self, key: &str) -> Option<&ValuationValue> {
        self.0.get(key)
    }

    /// 读取数值条目，文本或缺失条目返回 `None`。
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(ValuationValue::Number(v)) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// 股息率 (TTM)，单位为百分比。
    pub fn dividend_yield(&self) -> Option<f64> {
        self.number(DIVIDEND_YIELD_TTM)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValuationValue)> {
        self.0.iter()
    }
}

/// # Summary
/// 单日资金流向记录。
///
/// # Invariants
/// - 序列按日期升序排列，最后一条为最近交易日。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundFlowEntry {
    // 交易日
    pub date: NaiveDate,
    // 主力净流入 - 净额 (元)
    pub main_net_inflow: f64,
    // 主力净流入 - 净占比 (%)
    #[serde(default)]
    pub main_net_ratio: Option<f64>,
    // 收盘价
    #[serde(default)]
    pub close: Option<f64>,
    // 涨跌幅 (%)
    #[serde(default)]
    pub pct_change: Option<f64>,
}

/// # Summary
/// 按报告期汇总的财务摘要行。
///
/// # Invariants
/// - 增长率字段保留数据源原始文本 (例如 `"23.45%"`)，由成长性维度负责解析。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FinancialReport {
    // 报告期
    pub report_period: String,
    // 营业总收入同比增长率
    #[serde(default)]
    pub revenue_yoy: Option<String>,
    // 净利润同比增长率
    #[serde(default)]
    pub profit_yoy: Option<String>,
    // 其余展示用字段
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap_or_default(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 100.0,
        }
    }

    #[test]
    fn test_series_accepts_ascending_dates() {
        let series = PriceSeries::new(vec![bar(2, 10.0), bar(3, 11.0), bar(4, 12.0)]);
        assert!(series.is_ok());
        let series = series.unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.closes(), vec![10.0, 11.0, 12.0]);
        assert_eq!(series.latest().map(|b| b.close), Some(12.0));
    }

    #[test]
    fn test_series_rejects_duplicate_and_unordered_dates() {
        assert!(matches!(
            PriceSeries::new(vec![bar(2, 10.0), bar(2, 11.0)]),
            Err(MarketError::InvalidSeries(_))
        ));
        assert!(matches!(
            PriceSeries::new(vec![bar(3, 10.0), bar(2, 11.0)]),
            Err(MarketError::InvalidSeries(_))
        ));
    }

    #[test]
    fn test_valuation_snapshot_numbers_only() {
        let json = r#"{"股息率(TTM)": 2.5, "市盈率(TTM)": "亏损"}"#;
        let snapshot: ValuationSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.dividend_yield(), Some(2.5));
        assert_eq!(snapshot.number("市盈率(TTM)"), None);
        assert_eq!(
            snapshot.get("市盈率(TTM)"),
            Some(&ValuationValue::Text("亏损".to_string()))
        );
    }
}

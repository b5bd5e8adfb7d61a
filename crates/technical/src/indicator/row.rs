use kabu_core::market::entity::PriceBar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// # Summary
/// 单根 K 线及其全部技术指标值 (Indicator Row)。
///
/// # Invariants
/// - 与输入序列一一对应，行数相等、顺序一致。
/// - 历史不足或除零的指标为 `None`，不以 0 代替。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    // 原始 K 线
    pub bar: PriceBar,
    // 周期 -> 均线
    pub ma: BTreeMap<usize, Option<f64>>,
    // 快慢 EMA 之差
    pub dif: Option<f64>,
    // DIF 的信号线
    pub dea: Option<f64>,
    // 柱状值 2 × (DIF − DEA)
    pub macd: Option<f64>,
    // 周期 -> RSI
    pub rsi: BTreeMap<usize, Option<f64>>,
    pub k: Option<f64>,
    pub d: Option<f64>,
    pub j: Option<f64>,
    pub boll_mid: Option<f64>,
    pub boll_up: Option<f64>,
    pub boll_down: Option<f64>,
    // 成交量 / 尾随平均成交量
    pub volume_ratio: Option<f64>,
}

impl IndicatorRow {
    /// 指定周期的均线；未配置该周期或历史不足时为 `None`。
    pub fn ma(&self, period: usize) -> Option<f64> {
        self.ma.get(&period).copied().flatten()
    }

    /// 指定周期的 RSI。
    pub fn rsi(&self, period: usize) -> Option<f64> {
        self.rsi.get(&period).copied().flatten()
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

use crate::indicator::math::{
    as_f64, ema, ema_span, rolling_max, rolling_mean, rolling_min, rolling_std, zip_with,
};
use crate::indicator::row::IndicatorRow;
use kabu_core::config::IndicatorConfig;
use kabu_core::market::entity::PriceSeries;
use std::collections::BTreeMap;
use tracing::debug;

type Column = Vec<Option<f64>>;

/// # Summary
/// 技术指标计算引擎。
///
/// # Invariants
/// - 纯计算：同一序列多次计算得到完全相同的结果。
/// - 计算顺序为 MA、MACD、RSI、KDJ、BOLL、量比。
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndicatorConfig {
        &self.config
    }

    /// # Summary
    /// 为序列中每根 K 线计算全部指标。
    ///
    /// # Logic
    /// 1. 抽取收盘、最高、最低、成交量四列。
    /// 2. 按固定顺序逐个指标生成整列结果。
    /// 3. 按行拼装为 `IndicatorRow`。
    ///
    /// # Arguments
    /// * `series`: 只读日线序列。
    ///
    /// # Returns
    /// 与序列等长的指标行；空序列返回空列表。
    pub fn compute(&self, series: &PriceSeries) -> Vec<IndicatorRow> {
        let bars = series.bars();
        let closes: Column = bars.iter().map(|b| Some(b.close)).collect();
        let highs: Column = bars.iter().map(|b| Some(b.high)).collect();
        let lows: Column = bars.iter().map(|b| Some(b.low)).collect();
        let volumes: Column = bars.iter().map(|b| Some(b.volume)).collect();

        let ma: BTreeMap<usize, Column> = self
            .config
            .ma_periods
            .iter()
            .map(|&p| (p, rolling_mean(&closes, p)))
            .collect();
        let (dif, dea, hist) = self.macd(&closes);
        let rsi: BTreeMap<usize, Column> = self
            .config
            .rsi_periods
            .iter()
            .map(|&p| (p, Self::rsi(&closes, p)))
            .collect();
        let (k, d, j) = self.kdj(&highs, &lows, &closes);
        let (mid, up, down) = self.boll(&closes);
        let volume_ratio = self.volume_ratio(&volumes);

        debug!(bars = bars.len(), "Computed indicator columns");

        bars.iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRow {
                bar: bar.clone(),
                ma: ma.iter().map(|(p, col)| (*p, at(col, i))).collect(),
                dif: at(&dif, i),
                dea: at(&dea, i),
                macd: at(&hist, i),
                rsi: rsi.iter().map(|(p, col)| (*p, at(col, i))).collect(),
                k: at(&k, i),
                d: at(&d, i),
                j: at(&j, i),
                boll_mid: at(&mid, i),
                boll_up: at(&up, i),
                boll_down: at(&down, i),
                volume_ratio: at(&volume_ratio, i),
            })
            .collect()
    }

    /// DIF = EMA(fast) − EMA(slow)，DEA = EMA(DIF, signal)，柱 = 2 × (DIF − DEA)。
    fn macd(&self, closes: &[Option<f64>]) -> (Column, Column, Column) {
        let fast = ema_span(closes, self.config.macd_fast);
        let slow = ema_span(closes, self.config.macd_slow);
        let dif = zip_with(&fast, &slow, |f, s| Some(f - s));
        let dea = ema_span(&dif, self.config.macd_signal);
        let hist = zip_with(&dif, &dea, |a, b| Some(2.0 * (a - b)));
        (dif, dea, hist)
    }

    /// # Summary
    /// 简单平均版 RSI。
    ///
    /// # Logic
    /// 1. 首行涨跌未定义，其余为相邻收盘差。
    /// 2. 涨幅与跌幅分别取尾随 `period` 均值，首个定义值出现在下标 `period`。
    /// 3. 跌幅均值为 0 时：涨幅均值为正记 100，同为 0 则未定义。
    fn rsi(closes: &[Option<f64>], period: usize) -> Column {
        let deltas: Column = std::iter::once(None)
            .chain(closes.windows(2).map(|w| match (w[0], w[1]) {
                (Some(prev), Some(cur)) => Some(cur - prev),
                _ => None,
            }))
            .take(closes.len())
            .collect();
        let gains: Column = deltas.iter().map(|d| d.map(|d| d.max(0.0))).collect();
        let losses: Column = deltas.iter().map(|d| d.map(|d| (-d).max(0.0))).collect();
        let avg_gain = rolling_mean(&gains, period);
        let avg_loss = rolling_mean(&losses, period);
        zip_with(&avg_gain, &avg_loss, |gain, loss| {
            if loss == 0.0 {
                if gain > 0.0 { Some(100.0) } else { None }
            } else {
                Some(100.0 - 100.0 / (1.0 + gain / loss))
            }
        })
    }

    /// # Summary
    /// 随机指标 KDJ。
    ///
    /// # Logic
    /// 1. RSV = (收盘 − N 日最低) / (N 日最高 − N 日最低) × 100，区间为 0 时未定义。
    /// 2. K = EMA(RSV, 1/m1)，D = EMA(K, 1/m2)，均以首个定义值为种子。
    /// 3. J = 3K − 2D，不做截断。
    fn kdj(
        &self,
        highs: &[Option<f64>],
        lows: &[Option<f64>],
        closes: &[Option<f64>],
    ) -> (Column, Column, Column) {
        let n = self.config.kdj_period;
        let highest = rolling_max(highs, n);
        let lowest = rolling_min(lows, n);
        let range = zip_with(&highest, &lowest, |h, l| Some(h - l));
        let rsv: Column = closes
            .iter()
            .zip(lowest.iter().zip(range.iter()))
            .map(|(close, (low, range))| match (close, low, range) {
                (Some(c), Some(l), Some(r)) if *r > 0.0 => Some((c - l) / r * 100.0),
                _ => None,
            })
            .collect();
        let k = ema(&rsv, 1.0 / as_f64(self.config.kdj_k_smoothing));
        let d = ema(&k, 1.0 / as_f64(self.config.kdj_d_smoothing));
        let j = zip_with(&k, &d, |k, d| Some(3.0 * k - 2.0 * d));
        (k, d, j)
    }

    /// 布林带：中轨为 SMA，上下轨为中轨 ± 宽度 × 样本标准差。
    fn boll(&self, closes: &[Option<f64>]) -> (Column, Column, Column) {
        let period = self.config.boll_period;
        let width = self.config.boll_width;
        let mid = rolling_mean(closes, period);
        let std = rolling_std(closes, period);
        let up = zip_with(&mid, &std, |m, s| Some(m + width * s));
        let down = zip_with(&mid, &std, |m, s| Some(m - width * s));
        (mid, up, down)
    }

    /// 量比 = 当日成交量 / 尾随平均成交量，平均为 0 时未定义。
    fn volume_ratio(&self, volumes: &[Option<f64>]) -> Column {
        let mean = rolling_mean(volumes, self.config.volume_ratio_period);
        zip_with(volumes, &mean, |v, m| if m > 0.0 { Some(v / m) } else { None })
    }
}

fn at(col: &[Option<f64>], i: usize) -> Option<f64> {
    col.get(i).copied().flatten()
}

use crate::accumulator::{DimensionResult, ScoreAccumulator};
use kabu_core::config::{IndicatorConfig, SignalConfig};
use kabu_core::market::entity::PriceSeries;
use kabu_technical::{IndicatorEngine, IndicatorRow, Signal, SignalDetector, SignalSet};
use tracing::debug;

/// 技术面评分的完整产出，指标行与信号集合同时供报告使用。
#[derive(Debug, Clone)]
pub struct TechnicalOutcome {
    pub result: DimensionResult,
    pub rows: Vec<IndicatorRow>,
    pub signals: SignalSet,
}

/// # Summary
/// 技术面评分器，串联指标引擎与信号识别器。
#[derive(Debug, Clone)]
pub struct TechnicalScorer {
    engine: IndicatorEngine,
    detector: SignalDetector,
    min_bars: usize,
}

impl TechnicalScorer {
    pub fn new(indicator: IndicatorConfig, signal: SignalConfig, min_bars: usize) -> Self {
        Self {
            engine: IndicatorEngine::new(indicator),
            detector: SignalDetector::new(signal),
            min_bars,
        }
    }

    /// # Summary
    /// 对日线序列做技术面评分。
    ///
    /// # Logic
    /// 1. 有序列时总是计算指标行。
    /// 2. K 线数量少于 `min_bars` 时返回基准分且不识别信号。
    /// 3. 否则逐个信号记录 `"{指标族}: {标记} {描述}"`，偏多加 5，偏空减 5。
    ///
    /// # Arguments
    /// * `series`: 日线序列，缺失时返回基准分。
    pub fn evaluate(&self, series: Option<&PriceSeries>) -> TechnicalOutcome {
        let rows = series.map(|s| self.engine.compute(s)).unwrap_or_default();
        if rows.len() < self.min_bars {
            debug!(
                bars = rows.len(),
                required = self.min_bars,
                "Insufficient history for technical signals"
            );
            return TechnicalOutcome {
                result: DimensionResult::baseline(),
                rows,
                signals: SignalSet::default(),
            };
        }

        let signals = self.detector.detect(&rows);
        let result = signals
            .iter()
            .fold(ScoreAccumulator::baseline(), signal_rule)
            .finish();
        TechnicalOutcome {
            result,
            rows,
            signals,
        }
    }
}

/// 单个技术信号的评分规则。
pub fn signal_rule(acc: ScoreAccumulator, signal: &Signal) -> ScoreAccumulator {
    acc.adjust(
        signal.bias().score_delta(),
        format!("{}: {}", signal.family(), signal.labeled()),
    )
}

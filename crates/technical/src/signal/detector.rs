use crate::indicator::IndicatorRow;
use crate::signal::entity::{
    BollSignal, KdjSignal, MaSignal, MacdSignal, RsiSignal, Signal, SignalSet,
};
use kabu_core::config::SignalConfig;
use tracing::debug;

/// 两条线在最近两行之间的穿越关系。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Crossing {
    Above,
    Below,
}

/// # Summary
/// 判断 `a` 是否在最近两行之间穿越 `b`。
///
/// # Logic
/// - 上穿：最新 a > b 且前一行 a ≤ b。
/// - 下穿：最新 a < b 且前一行 a ≥ b。
/// - 任一行任一值未定义时不构成穿越。
fn crossing(
    latest: (Option<f64>, Option<f64>),
    previous: (Option<f64>, Option<f64>),
) -> Option<Crossing> {
    let (a, b) = (latest.0?, latest.1?);
    let (pa, pb) = (previous.0?, previous.1?);
    if a > b && pa <= pb {
        Some(Crossing::Above)
    } else if a < b && pa >= pb {
        Some(Crossing::Below)
    } else {
        None
    }
}

/// # Summary
/// 技术信号识别器。
///
/// # Invariants
/// - 只读取最后两行；只有一行时前一行即最新行。
/// - 某指标族所需的最新值未定义时跳过该族。
#[derive(Debug, Clone)]
pub struct SignalDetector {
    config: SignalConfig,
}

impl SignalDetector {
    pub fn new(config: SignalConfig) -> Self {
        Self { config }
    }

    /// # Summary
    /// 识别最新交易日的技术信号。
    ///
    /// # Logic
    /// 1. 空输入返回空集合。
    /// 2. 依次评估 MA、MACD、RSI、KDJ、BOLL 五个指标族，每族按优先级取第一个命中的规则。
    ///
    /// # Arguments
    /// * `rows`: 按日期升序的指标行。
    ///
    /// # Returns
    /// 信号集合。
    pub fn detect(&self, rows: &[IndicatorRow]) -> SignalSet {
        let Some(latest) = rows.last() else {
            return SignalSet::default();
        };
        let previous = rows.len().checked_sub(2).and_then(|i| rows.get(i)).unwrap_or(latest);

        let signals: Vec<Signal> = [
            self.ma(latest, previous).map(Signal::Ma),
            Self::macd(latest, previous).map(Signal::Macd),
            self.rsi(latest).map(Signal::Rsi),
            self.kdj(latest, previous).map(Signal::Kdj),
            Self::boll(latest).map(Signal::Boll),
        ]
        .into_iter()
        .flatten()
        .collect();

        debug!(
            date = %latest.bar.date,
            detected = signals.len(),
            "Detected technical signals"
        );
        SignalSet::new(signals)
    }

    fn ma(&self, latest: &IndicatorRow, previous: &IndicatorRow) -> Option<MaSignal> {
        let (fast, slow) = (self.config.ma_fast, self.config.ma_slow);
        let ma_fast = latest.ma(fast)?;
        let ma_slow = latest.ma(slow)?;
        let close = latest.close();
        let signal = match crossing(
            (Some(ma_fast), Some(ma_slow)),
            (previous.ma(fast), previous.ma(slow)),
        ) {
            Some(Crossing::Above) => MaSignal::GoldenCross { fast, slow },
            Some(Crossing::Below) => MaSignal::DeathCross { fast, slow },
            None if close > ma_fast && ma_fast > ma_slow => MaSignal::BullishAlignment,
            None if close < ma_fast && ma_fast < ma_slow => MaSignal::BearishAlignment,
            None => MaSignal::Range,
        };
        Some(signal)
    }

    fn macd(latest: &IndicatorRow, previous: &IndicatorRow) -> Option<MacdSignal> {
        let dif = latest.dif?;
        let dea = latest.dea?;
        let signal = match crossing((Some(dif), Some(dea)), (previous.dif, previous.dea)) {
            Some(Crossing::Above) => MacdSignal::GoldenCross,
            Some(Crossing::Below) => MacdSignal::DeathCross,
            None => match latest.macd {
                Some(hist) if hist > 0.0 => MacdSignal::Bullish,
                _ => MacdSignal::Bearish,
            },
        };
        Some(signal)
    }

    fn rsi(&self, latest: &IndicatorRow) -> Option<RsiSignal> {
        let value = latest.rsi(self.config.rsi_period)?;
        let signal = if value > self.config.rsi_overbought {
            RsiSignal::Overbought(value)
        } else if value < self.config.rsi_oversold {
            RsiSignal::Oversold(value)
        } else if value > self.config.rsi_midline {
            RsiSignal::Strong(value)
        } else {
            RsiSignal::Weak(value)
        };
        Some(signal)
    }

    /// # Summary
    /// KDJ 信号。
    ///
    /// # Logic
    /// 1. K 上穿 D 且穿越两侧任一 K 值低于低位线：低位金叉。
    /// 2. K 下穿 D 且穿越两侧任一 K 值高于高位线：高位死叉。
    /// 3. 否则按 J 值判定超买、超卖或中性。
    fn kdj(&self, latest: &IndicatorRow, previous: &IndicatorRow) -> Option<KdjSignal> {
        let k = latest.k?;
        let d = latest.d?;
        let prev_k = previous.k;
        let in_low_zone = k < self.config.kdj_low || prev_k.is_some_and(|pk| pk < self.config.kdj_low);
        let in_high_zone =
            k > self.config.kdj_high || prev_k.is_some_and(|pk| pk > self.config.kdj_high);

        let signal = match crossing((Some(k), Some(d)), (prev_k, previous.d)) {
            Some(Crossing::Above) if in_low_zone => KdjSignal::LowGoldenCross,
            Some(Crossing::Below) if in_high_zone => KdjSignal::HighDeathCross,
            _ => match latest.j {
                Some(j) if j > self.config.j_overbought => KdjSignal::Overbought { j },
                Some(j) if j < self.config.j_oversold => KdjSignal::Oversold { j },
                _ => KdjSignal::Neutral,
            },
        };
        Some(signal)
    }

    fn boll(latest: &IndicatorRow) -> Option<BollSignal> {
        let up = latest.boll_up?;
        let down = latest.boll_down?;
        let close = latest.close();
        if close > up {
            return Some(BollSignal::UpperBreach);
        }
        if close < down {
            return Some(BollSignal::LowerBreach);
        }
        // 中轨为 0 时带宽未定义，仍判定为通道内
        let width_pct = latest
            .boll_mid
            .filter(|mid| *mid != 0.0)
            .map(|mid| (up - down) / mid * 100.0);
        Some(BollSignal::InChannel { width_pct })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing_rules() {
        assert_eq!(
            crossing((Some(2.0), Some(1.0)), (Some(1.0), Some(1.0))),
            Some(Crossing::Above)
        );
        assert_eq!(
            crossing((Some(1.0), Some(2.0)), (Some(2.0), Some(2.0))),
            Some(Crossing::Below)
        );
        assert_eq!(crossing((Some(2.0), Some(1.0)), (Some(3.0), Some(1.0))), None);
        assert_eq!(crossing((Some(2.0), Some(1.0)), (None, Some(1.0))), None);
    }
}

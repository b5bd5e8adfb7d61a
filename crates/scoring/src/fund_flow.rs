use crate::accumulator::{DimensionResult, ScoreAccumulator};
use kabu_core::market::entity::FundFlowEntry;

/// 一亿元。
const YI: f64 = 1e8;

/// # Summary
/// 资金面维度评分。
///
/// # Logic
/// 1. 取升序序列的最后 `window` 条记录。
/// 2. 窗口合计净流入为正加 15，否则减 10。
/// 3. 窗口内最后 `recent` 条合计与最新一条同为正加 10，同为负减 10。
///
/// # Arguments
/// * `entries`: 逐日资金流向，缺失或为空时返回基准分。
/// * `window`: 统计窗口 (默认 10)。
/// * `recent`: 近期窗口 (默认 3)。
pub fn score(entries: Option<&[FundFlowEntry]>, window: usize, recent: usize) -> DimensionResult {
    let acc = ScoreAccumulator::baseline();
    let Some(entries) = entries.filter(|e| !e.is_empty()) else {
        return acc.finish();
    };
    let tail = &entries[entries.len().saturating_sub(window)..];
    let flows: Vec<f64> = tail.iter().map(|e| e.main_net_inflow).collect();

    let total: f64 = flows.iter().sum();
    let recent_total: f64 = flows[flows.len().saturating_sub(recent)..].iter().sum();
    let latest = flows.last().copied();

    let acc = trend_rule(acc, Some((window, total)));
    let acc = momentum_rule(acc, latest.map(|l| (recent_total, l)));
    acc.finish()
}

/// 整体趋势：窗口合计净流入 (元)。
pub fn trend_rule(acc: ScoreAccumulator, input: Option<(usize, f64)>) -> ScoreAccumulator {
    match input {
        Some((days, total)) if total > 0.0 => {
            acc.adjust(15, format!("🟢 近{}日主力净流入{:.2}亿", days, total / YI))
        }
        Some((days, total)) => {
            acc.adjust(-10, format!("🔴 近{}日主力净流出{:.2}亿", days, total.abs() / YI))
        }
        None => acc,
    }
}

/// 近期趋势：(近期合计, 最新一日)。
pub fn momentum_rule(acc: ScoreAccumulator, input: Option<(f64, f64)>) -> ScoreAccumulator {
    match input {
        Some((recent, latest)) if recent > 0.0 && latest > 0.0 => acc.adjust(10, "🟢 资金持续流入"),
        Some((recent, latest)) if recent < 0.0 && latest < 0.0 => {
            acc.adjust(-10, "🔴 资金持续流出")
        }
        _ => acc,
    }
}

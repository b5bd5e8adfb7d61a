use crate::accumulator::{DimensionResult, ScoreAccumulator};
use kabu_core::market::entity::{QuoteSnapshot, ValuationSnapshot};

/// # Summary
/// 估值维度评分。
///
/// # Logic
/// 1. 市盈率 (动态) 与市净率取自实时行情快照，仅在为正数时参与评分。
/// 2. 股息率 (TTM) 取自估值快照，仅数值条目参与评分。
///
/// # Arguments
/// * `quote`: 实时行情快照，缺失时跳过 PE/PB 规则。
/// * `valuation`: 估值快照，缺失时跳过股息率规则。
pub fn score(quote: Option<&QuoteSnapshot>, valuation: Option<&ValuationSnapshot>) -> DimensionResult {
    let acc = ScoreAccumulator::baseline();
    let acc = pe_rule(acc, quote.and_then(|q| q.pe));
    let acc = pb_rule(acc, quote.and_then(|q| q.pb));
    let acc = dividend_rule(acc, valuation.and_then(|v| v.dividend_yield()));
    acc.finish()
}

/// 市盈率：<15 加 20，<25 加 10，<40 仅记录，其余减 10。
pub fn pe_rule(acc: ScoreAccumulator, pe: Option<f64>) -> ScoreAccumulator {
    match pe {
        Some(pe) if pe > 0.0 && pe < 15.0 => acc.adjust(20, "🟢 PE<15，估值较低"),
        Some(pe) if pe > 0.0 && pe < 25.0 => acc.adjust(10, "🟡 PE适中 (15-25)"),
        Some(pe) if pe > 0.0 && pe < 40.0 => acc.note("🟡 PE偏高 (25-40)"),
        Some(pe) if pe > 0.0 => acc.adjust(-10, "🔴 PE>40，估值较高"),
        _ => acc,
    }
}

/// 市净率：<2 加 10，>5 减 5。
pub fn pb_rule(acc: ScoreAccumulator, pb: Option<f64>) -> ScoreAccumulator {
    match pb {
        Some(pb) if pb > 0.0 && pb < 2.0 => acc.adjust(10, "🟢 PB<2，价值凸显"),
        Some(pb) if pb > 5.0 => acc.adjust(-5, "🔴 PB>5，溢价较高"),
        _ => acc,
    }
}

/// 股息率 (%)：>2 加 10。
pub fn dividend_rule(acc: ScoreAccumulator, dividend_yield: Option<f64>) -> ScoreAccumulator {
    match dividend_yield {
        Some(dv) if dv > 2.0 => acc.adjust(10, format!("🟢 股息率{:.2}%，有分红价值", dv)),
        _ => acc,
    }
}

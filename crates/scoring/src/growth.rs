use crate::accumulator::{DimensionResult, ScoreAccumulator};
use kabu_core::market::entity::FinancialReport;
use tracing::debug;

/// # Summary
/// 解析数据源返回的百分比文本。
///
/// # Logic
/// 1. 去除首尾空白与末尾的 `%`。
/// 2. 空串、`False`、`nan` 以及无法解析或非有限的数值均视为缺失。
///
/// # Returns
/// 百分比数值 (例如 `"23.45%"` 返回 `23.45`)；缺失时返回 `None` 并记录 debug 日志。
pub fn parse_percentage(raw: &str) -> Option<f64> {
    let text = raw.trim();
    let text = text.strip_suffix('%').unwrap_or(text).trim();
    if text.is_empty() || text == "False" || text.eq_ignore_ascii_case("nan") {
        debug!(raw, "Skipping malformed percentage field");
        return None;
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            debug!(raw, "Skipping malformed percentage field");
            None
        }
    }
}

/// # Summary
/// 成长性维度评分，只看最近一期财务摘要。
///
/// # Arguments
/// * `reports`: 财务摘要，最近一期在前；为空或缺失时返回基准分。
pub fn score(reports: Option<&[FinancialReport]>) -> DimensionResult {
    let latest = reports.and_then(|r| r.first());
    let revenue = latest
        .and_then(|r| r.revenue_yoy.as_deref())
        .and_then(parse_percentage);
    let profit = latest
        .and_then(|r| r.profit_yoy.as_deref())
        .and_then(parse_percentage);

    let acc = ScoreAccumulator::baseline();
    let acc = revenue_rule(acc, revenue);
    let acc = profit_rule(acc, profit);
    acc.finish()
}

/// 营收同比：>30 加 25，>15 加 15，>0 加 5，其余减 10。
pub fn revenue_rule(acc: ScoreAccumulator, growth: Option<f64>) -> ScoreAccumulator {
    let Some(g) = growth else {
        return acc;
    };
    if g > 30.0 {
        acc.adjust(25, format!("🟢 营收增速{:.1}%，高增长", g))
    } else if g > 15.0 {
        acc.adjust(15, format!("🟢 营收增速{:.1}%，稳健增长", g))
    } else if g > 0.0 {
        acc.adjust(5, format!("🟡 营收增速{:.1}%", g))
    } else {
        acc.adjust(-10, format!("🔴 营收负增长{:.1}%", g))
    }
}

/// 净利润同比：>30 加 25，>15 加 15，<0 减 15，[0, 15] 不变。
pub fn profit_rule(acc: ScoreAccumulator, growth: Option<f64>) -> ScoreAccumulator {
    let Some(g) = growth else {
        return acc;
    };
    if g > 30.0 {
        acc.adjust(25, format!("🟢 净利润增速{:.1}%，高增长", g))
    } else if g > 15.0 {
        acc.adjust(15, format!("🟢 净利润增速{:.1}%，稳健", g))
    } else if g < 0.0 {
        acc.adjust(-15, format!("🔴 净利润负增长{:.1}%", g))
    } else {
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_percentage() {
        assert_eq!(parse_percentage("23.45%"), Some(23.45));
        assert_eq!(parse_percentage(" -8.1% "), Some(-8.1));
        assert_eq!(parse_percentage("12"), Some(12.0));
        assert_eq!(parse_percentage(""), None);
        assert_eq!(parse_percentage("False"), None);
        assert_eq!(parse_percentage("nan"), None);
        assert_eq!(parse_percentage("NaN%"), None);
        assert_eq!(parse_percentage("inf"), None);
        assert_eq!(parse_percentage("--"), None);
    }
}

use chrono::NaiveDateTime;
use kabu_analyzer::AnalysisOutcome;
use kabu_core::cache::port::CacheStats;
use kabu_core::common::Dimension;
use kabu_core::market::entity::QuoteSnapshot;
use kabu_technical::IndicatorRow;

const DISCLAIMER: &str = "> ⚠️ 以上分析仅供参考，不构成投资建议。投资有风险，入市需谨慎。";

fn icon(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Valuation => "💰",
        Dimension::Growth => "📈",
        Dimension::FundFlow => "💵",
        Dimension::Technical => "📉",
    }
}

/// 两位小数，缺失值为 `N/A`。
fn value(v: Option<f64>) -> String {
    v.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
}

fn value_with_unit(v: Option<f64>, unit: &str) -> String {
    v.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}{}", v, unit))
}

/// # Summary
/// 将分析结果渲染为 Markdown 报告。
///
/// # Logic
/// 1. 标题、分析时间、综合评分与投资建议。
/// 2. 每个参与评分的维度一节，列出得分与理由。
/// 3. 最新交易日的指标表与信号表，没有指标时省略。
/// 4. 有实时行情时附基本信息表。
/// 5. 末尾附免责声明。
///
/// # Arguments
/// * `outcome`: 分析结果。
/// * `generated_at`: 报告中显示的分析时间。
pub fn render_markdown(outcome: &AnalysisOutcome, generated_at: NaiveDateTime) -> String {
    let mut lines = vec![
        format!(
            "# {} ({}) 投资分析报告",
            outcome.display_name(),
            outcome.stock.symbol
        ),
        String::new(),
        format!("**分析时间**: {}", generated_at.format("%Y-%m-%d %H:%M")),
        String::new(),
        "---".to_string(),
        String::new(),
        format!("## 📊 综合评分: {}/100", outcome.composite.total_score),
        String::new(),
        outcome.composite.recommendation.to_string(),
        String::new(),
        "---".to_string(),
    ];

    for (dimension, result) in outcome.scores.present() {
        lines.push(String::new());
        lines.push(format!(
            "### {} {} (得分: {})",
            icon(dimension),
            dimension.title(),
            result.score
        ));
        lines.push(String::new());
        if result.signals.is_empty() {
            lines.push("- 暂无可用数据".to_string());
        }
        lines.extend(result.signals.iter().map(|s| format!("- {}", s)));
    }

    if let Some(row) = outcome.latest_indicators() {
        lines.push(String::new());
        lines.extend(indicator_table(row));
    }

    if !outcome.signals.is_empty() {
        lines.push(String::new());
        lines.push("## 🚦 技术信号".to_string());
        lines.push(String::new());
        lines.push("| 指标 | 信号 |".to_string());
        lines.push("|------|------|".to_string());
        lines.extend(
            outcome
                .signals
                .iter()
                .map(|s| format!("| {} | {} |", s.family(), s.labeled())),
        );
    }

    if let Some(quote) = &outcome.quote {
        lines.push(String::new());
        lines.extend(quote_table(quote));
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(DISCLAIMER.to_string());
    lines.push(String::new());
    lines.join("\n")
}

fn indicator_table(row: &IndicatorRow) -> Vec<String> {
    let mut lines = vec![
        format!("## 📉 技术指标 ({})", row.bar.date),
        String::new(),
        "| 指标 | 数值 |".to_string(),
        "|------|------|".to_string(),
        format!("| 收盘价 | {:.2} |", row.close()),
    ];
    lines.extend(
        row.ma
            .iter()
            .map(|(period, v)| format!("| MA{} | {} |", period, value(*v))),
    );
    lines.push(format!(
        "| MACD (DIF/DEA/MACD) | {} / {} / {} |",
        value(row.dif),
        value(row.dea),
        value(row.macd)
    ));
    lines.extend(
        row.rsi
            .iter()
            .map(|(period, v)| format!("| RSI{} | {} |", period, value(*v))),
    );
    lines.push(format!(
        "| KDJ (K/D/J) | {} / {} / {} |",
        value(row.k),
        value(row.d),
        value(row.j)
    ));
    lines.push(format!(
        "| BOLL (上/中/下) | {} / {} / {} |",
        value(row.boll_up),
        value(row.boll_mid),
        value(row.boll_down)
    ));
    lines.push(format!("| 量比 | {} |", value(row.volume_ratio)));
    lines
}

fn quote_table(quote: &QuoteSnapshot) -> Vec<String> {
    vec![
        "## 📋 基本信息".to_string(),
        String::new(),
        "| 项目 | 数值 |".to_string(),
        "|------|------|".to_string(),
        format!("| 最新价 | {} |", value_with_unit(quote.price, " 元")),
        format!("| 涨跌幅 | {} |", value_with_unit(quote.pct_change, "%")),
        format!(
            "| 总市值 | {} |",
            value_with_unit(quote.market_cap.map(|c| c / 1e8), " 亿")
        ),
        format!("| 市盈率 | {} |", value(quote.pe)),
        format!("| 市净率 | {} |", value(quote.pb)),
    ]
}

/// 缓存统计的文本输出。
pub fn render_cache_stats(stats: &CacheStats) -> String {
    [
        "缓存统计".to_string(),
        format!("  总条目: {}", stats.total),
        format!("  已过期: {}", stats.expired),
        format!("  有效: {}", stats.valid),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_formats_missing_as_na() {
        assert_eq!(value(None), "N/A");
        assert_eq!(value(Some(3.14159)), "3.14");
        assert_eq!(value_with_unit(Some(1.5), "%"), "1.50%");
        assert_eq!(value_with_unit(None, "%"), "N/A");
    }

    #[test]
    fn test_render_cache_stats() {
        let stats = CacheStats {
            total: 5,
            expired: 2,
            valid: 3,
        };
        assert_eq!(
            render_cache_stats(&stats),
            "缓存统计\n  总条目: 5\n  已过期: 2\n  有效: 3"
        );
    }
}

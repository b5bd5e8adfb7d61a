use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use kabu_analyzer::InvestmentAnalyzer;
use kabu_core::common::{Adjustment, Dimension, Exchange, Stock};
use kabu_core::config::AppConfig;
use kabu_core::market::entity::{
    DIVIDEND_YIELD_TTM, FinancialReport, FundFlowEntry, PriceBar, QuoteSnapshot,
    ValuationSnapshot, ValuationValue,
};
use kabu_core::market::error::MarketError;
use kabu_core::market::port::MarketDataProvider;
use kabu_scoring::{DimensionResult, Recommendation};
use std::collections::BTreeMap;
use std::sync::Arc;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
}

/// 返回固定数据的模拟数据源
struct StaticProvider {
    bars: usize,
}

#[async_trait]
impl MarketDataProvider for StaticProvider {
    async fn fetch_price_series(
        &self,
        _: &Stock,
        _start: NaiveDate,
        end: NaiveDate,
        _: Adjustment,
    ) -> Result<Vec<PriceBar>, MarketError> {
        let first = end - Duration::days(i64::try_from(self.bars).unwrap());
        Ok((0..u32::try_from(self.bars).unwrap())
            .map(|step| {
                let close = 20.0 + (f64::from(step) * 0.3).sin() + f64::from(step) * 0.02;
                PriceBar {
                    date: first + Duration::days(i64::from(step)),
                    open: close - 0.1,
                    high: close + 0.3,
                    low: close - 0.3,
                    close,
                    volume: 5000.0 + f64::from(step % 4) * 250.0,
                }
            })
            .collect())
    }

    async fn fetch_quote_snapshot(&self, stock: &Stock) -> Result<Option<QuoteSnapshot>, MarketError> {
        Ok(Some(QuoteSnapshot {
            symbol: stock.symbol.clone(),
            name: Some("立讯精密".to_string()),
            price: Some(38.5),
            pct_change: Some(1.2),
            pe: Some(12.0),
            pb: Some(1.5),
            market_cap: Some(2.8e11),
        }))
    }

    async fn fetch_valuation_snapshot(&self, _: &Stock) -> Result<ValuationSnapshot, MarketError> {
        let mut items = BTreeMap::new();
        items.insert(DIVIDEND_YIELD_TTM.to_string(), ValuationValue::Number(3.0));
        Ok(ValuationSnapshot::new(items))
    }

    async fn fetch_fund_flow(&self, _: &Stock) -> Result<Option<Vec<FundFlowEntry>>, MarketError> {
        Ok(Some(
            (1..=10)
                .map(|d| FundFlowEntry {
                    date: NaiveDate::from_ymd_opt(2024, 12, d).unwrap(),
                    main_net_inflow: 1e8,
                    main_net_ratio: Some(3.0),
                    close: None,
                    pct_change: None,
                })
                .collect(),
        ))
    }

    async fn fetch_financial_summary(&self, _: &Stock) -> Result<Vec<FinancialReport>, MarketError> {
        Ok(vec![FinancialReport {
            report_period: "2024-09-30".to_string(),
            revenue_yoy: Some("35%".to_string()),
            profit_yoy: Some("20%".to_string()),
            extra: BTreeMap::new(),
        }])
    }
}

/// 所有请求均失败的数据源
struct FailingProvider;

#[async_trait]
impl MarketDataProvider for FailingProvider {
    async fn fetch_price_series(
        &self,
        _: &Stock,
        _: NaiveDate,
        _: NaiveDate,
        _: Adjustment,
    ) -> Result<Vec<PriceBar>, MarketError> {
        Err(MarketError::Network("connection refused".to_string()))
    }

    async fn fetch_quote_snapshot(&self, _: &Stock) -> Result<Option<QuoteSnapshot>, MarketError> {
        Err(MarketError::Network("connection refused".to_string()))
    }

    async fn fetch_valuation_snapshot(&self, _: &Stock) -> Result<ValuationSnapshot, MarketError> {
        Err(MarketError::Unsupported("valuation snapshot".to_string()))
    }

    async fn fetch_fund_flow(&self, _: &Stock) -> Result<Option<Vec<FundFlowEntry>>, MarketError> {
        Err(MarketError::Parse("unexpected payload".to_string()))
    }

    async fn fetch_financial_summary(&self, _: &Stock) -> Result<Vec<FinancialReport>, MarketError> {
        Err(MarketError::NotFound)
    }
}

#[tokio::test]
async fn test_full_analysis_combines_all_dimensions() -> anyhow::Result<()> {
    let analyzer = InvestmentAnalyzer::new(Arc::new(StaticProvider { bars: 150 }), &AppConfig::default());
    let outcome = analyzer.analyze_at("002475", today()).await;

    assert_eq!(outcome.stock.exchange, Exchange::Sz);
    assert_eq!(outcome.display_name(), "立讯精密");
    assert_eq!(outcome.bar_count, 150);
    assert_eq!(outcome.indicators.len(), 150);
    assert_eq!(outcome.signals.len(), 5);

    let valuation = outcome.scores.valuation.as_ref().map(|r| r.score);
    let growth = outcome.scores.growth.as_ref().map(|r| r.score);
    let fund_flow = outcome.scores.fund_flow.as_ref().map(|r| r.score);
    assert_eq!(valuation, Some(90));
    assert_eq!(growth, Some(90));
    assert_eq!(fund_flow, Some(75));

    let technical = outcome
        .scores
        .technical
        .as_ref()
        .map(|r| r.score)
        .ok_or_else(|| anyhow::anyhow!("technical dimension missing"))?;
    let expected = (90 * 30 + 90 * 30 + 75 * 20 + technical * 20).div_euclid(100);
    assert_eq!(outcome.composite.total_score, expected);
    assert_eq!(
        outcome.composite.recommendation,
        Recommendation::from_score(expected)
    );
    Ok(())
}

#[tokio::test]
async fn test_failures_degrade_to_baseline() {
    let analyzer = InvestmentAnalyzer::new(Arc::new(FailingProvider), &AppConfig::default());
    let outcome = analyzer.analyze_at("600519", today()).await;

    assert_eq!(outcome.stock.exchange, Exchange::Sh);
    assert!(outcome.quote.is_none());
    assert_eq!(outcome.display_name(), "600519");
    assert!(outcome.indicators.is_empty());
    assert!(outcome.signals.is_empty());
    for dimension in Dimension::ALL {
        assert_eq!(outcome.scores.get(dimension), Some(&DimensionResult::baseline()));
    }
    assert_eq!(outcome.composite.total_score, 50);
    assert_eq!(outcome.composite.recommendation, Recommendation::HoldCautious);
}

#[tokio::test]
async fn test_short_history_keeps_technical_at_baseline() {
    let analyzer = InvestmentAnalyzer::new(Arc::new(StaticProvider { bars: 60 }), &AppConfig::default());
    let outcome = analyzer.analyze_at("002475", today()).await;

    assert_eq!(outcome.bar_count, 60);
    assert_eq!(outcome.indicators.len(), 60);
    assert!(outcome.signals.is_empty());
    assert_eq!(outcome.scores.technical, Some(DimensionResult::baseline()));
}

#[tokio::test]
async fn test_disabled_dimensions_are_excluded() {
    let mut config = AppConfig::default();
    config.analysis.dimensions = vec![Dimension::Valuation, Dimension::Growth];
    let analyzer = InvestmentAnalyzer::new(Arc::new(StaticProvider { bars: 150 }), &config);
    let outcome = analyzer.analyze_at("002475", today()).await;

    assert!(outcome.scores.fund_flow.is_none());
    assert!(outcome.scores.technical.is_none());
    // 90 × 30% + 90 × 30%，缺失维度不重新归一化
    assert_eq!(outcome.composite.total_score, 54);
}

#[tokio::test]
async fn test_oversized_history_window_does_not_overflow() {
    let mut config = AppConfig::default();
    config.analysis.history_days = i64::MAX;
    let analyzer = InvestmentAnalyzer::new(Arc::new(StaticProvider { bars: 150 }), &config);
    let outcome = analyzer.analyze_at("002475", today()).await;

    assert_eq!(outcome.bar_count, 150);
}

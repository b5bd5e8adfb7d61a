use chrono::{Duration, Local, NaiveDate};
use kabu_core::common::{Dimension, Stock};
use kabu_core::config::{AnalysisConfig, AppConfig};
use kabu_core::market::entity::{
    FinancialReport, FundFlowEntry, PriceSeries, QuoteSnapshot, ValuationSnapshot,
};
use kabu_core::market::error::MarketError;
use kabu_core::market::port::MarketDataProvider;
use kabu_scoring::technical::TechnicalScorer;
use kabu_scoring::{CompositeResult, CompositeScorer, DimensionScores, fund_flow, growth, valuation};
use kabu_technical::{IndicatorRow, SignalSet};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// # Summary
/// 一次分析的完整产出，可直接交给任意报告渲染器。
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub stock: Stock,
    // 报告抬头使用的实时行情
    pub quote: Option<QuoteSnapshot>,
    pub scores: DimensionScores,
    pub composite: CompositeResult,
    // 全部指标行，最后一行为最新交易日
    pub indicators: Vec<IndicatorRow>,
    pub signals: SignalSet,
    // 参与计算的日 K 线数量
    pub bar_count: usize,
}

impl AnalysisOutcome {
    /// 报告标题使用的名称，没有行情时退回代码。
    pub fn display_name(&self) -> &str {
        self.quote
            .as_ref()
            .and_then(|q| q.name.as_deref())
            .unwrap_or(&self.stock.symbol)
    }

    pub fn latest_indicators(&self) -> Option<&IndicatorRow> {
        self.indicators.last()
    }
}

/// 分析所需的原始数据，任一项获取失败均为 `None`。
struct Inputs {
    quote: Option<QuoteSnapshot>,
    valuation: Option<ValuationSnapshot>,
    series: Option<PriceSeries>,
    fund_flow: Option<Vec<FundFlowEntry>>,
    financial: Option<Vec<FinancialReport>>,
}

/// # Summary
/// 投资分析器，系统的应用服务层门面 (Facade)。
///
/// # Invariants
/// - 只持有不可变配置与 `Arc` 注入的数据源，可并发分析不同股票。
/// - 分析总能产出结果：任何数据获取失败只会让对应维度退化为基准分。
pub struct InvestmentAnalyzer {
    provider: Arc<dyn MarketDataProvider>,
    analysis: AnalysisConfig,
    technical: TechnicalScorer,
    composite: CompositeScorer,
}

fn tolerate<T>(stock: &Stock, what: &str, result: Result<T, MarketError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(MarketError::Unsupported(detail)) => {
            info!(stock = %stock, what, detail = %detail, "Data source does not provide this data");
            None
        }
        Err(e) => {
            warn!(stock = %stock, what, error = %e, "Failed to fetch data, degrading dimension");
            None
        }
    }
}

impl InvestmentAnalyzer {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &AppConfig) -> Self {
        Self {
            provider,
            analysis: config.analysis.clone(),
            technical: TechnicalScorer::new(
                config.indicator.clone(),
                config.signal.clone(),
                config.analysis.min_technical_bars,
            ),
            composite: CompositeScorer::new(config.weights),
        }
    }

    /// 以本地当前日期为截止日进行分析。
    pub async fn analyze(&self, code: &str) -> AnalysisOutcome {
        self.analyze_at(code, Local::now().date_naive()).await
    }

    /// # Summary
    /// 以指定日期为截止日分析单只股票。
    ///
    /// # Logic
    /// 1. 由代码推导证券身份。
    /// 2. 依次拉取行情、估值、日 K 线、资金流向、财务摘要，失败记录日志后视为缺失。
    /// 3. 计算指标并识别信号。
    /// 4. 对启用的维度评分，最后做加权综合。
    ///
    /// # Arguments
    /// * `code`: 证券代码。
    /// * `today`: 分析截止日，K 线区间为 `[today - history_days, today]`。
    ///
    /// # Returns
    /// 分析结果，永不失败。
    pub async fn analyze_at(&self, code: &str, today: NaiveDate) -> AnalysisOutcome {
        let stock = Stock::from_code(code);
        info!(stock = %stock, exchange = stock.exchange.prefix(), "Starting analysis");

        let inputs = self.fetch_inputs(&stock, today).await;
        let technical = self.technical.evaluate(inputs.series.as_ref());
        let enabled = |d: Dimension| self.analysis.is_enabled(d);

        let scores = DimensionScores {
            valuation: enabled(Dimension::Valuation)
                .then(|| valuation::score(inputs.quote.as_ref(), inputs.valuation.as_ref())),
            growth: enabled(Dimension::Growth)
                .then(|| growth::score(inputs.financial.as_deref())),
            fund_flow: enabled(Dimension::FundFlow).then(|| {
                fund_flow::score(
                    inputs.fund_flow.as_deref(),
                    self.analysis.fund_flow_window,
                    self.analysis.fund_flow_recent,
                )
            }),
            technical: enabled(Dimension::Technical).then_some(technical.result),
        };
        let composite = self.composite.score(&scores);

        info!(
            stock = %stock,
            total = composite.total_score,
            recommendation = ?composite.recommendation,
            "Analysis finished"
        );

        AnalysisOutcome {
            bar_count: inputs.series.as_ref().map_or(0, PriceSeries::len),
            stock,
            quote: inputs.quote,
            scores,
            composite,
            indicators: technical.rows,
            signals: technical.signals,
        }
    }

    async fn fetch_inputs(&self, stock: &Stock, today: NaiveDate) -> Inputs {
        let p = &self.provider;
        let enabled = |d: Dimension| self.analysis.is_enabled(d);

        let quote = tolerate(stock, "quote", p.fetch_quote_snapshot(stock).await).flatten();

        let valuation = if enabled(Dimension::Valuation) {
            tolerate(stock, "valuation", p.fetch_valuation_snapshot(stock).await)
        } else {
            None
        };

        let start = Duration::try_days(self.analysis.history_days)
            .and_then(|d| today.checked_sub_signed(d))
            .unwrap_or(NaiveDate::MIN);
        let series = tolerate(
            stock,
            "daily_kline",
            p.fetch_price_series(stock, start, today, self.analysis.adjustment)
                .await
                .and_then(PriceSeries::new),
        );

        let fund_flow = if enabled(Dimension::FundFlow) {
            tolerate(stock, "fund_flow", p.fetch_fund_flow(stock).await).flatten()
        } else {
            None
        };

        let financial = if enabled(Dimension::Growth) {
            tolerate(stock, "financial", p.fetch_financial_summary(stock).await)
        } else {
            None
        };

        Inputs {
            quote,
            valuation,
            series,
            fund_flow,
            financial,
        }
    }
}

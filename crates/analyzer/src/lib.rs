//! # kabu-analyzer
//!
//! 单只股票的完整分析流程：拉取数据、计算指标、识别信号、四维评分与加权综合。

pub mod analyzer;

pub use analyzer::{AnalysisOutcome, InvestmentAnalyzer};

//! # kabu-scoring
//!
//! 四个维度的评分器与加权综合评分。每个维度从基准分 50 出发，
//! 通过一系列纯函数规则累加分值并记录理由；输入缺失的规则不产生任何影响。

pub mod accumulator;
pub mod composite;
pub mod fund_flow;
pub mod growth;
pub mod technical;
pub mod valuation;

pub use accumulator::{DimensionResult, ScoreAccumulator};
pub use composite::{CompositeResult, CompositeScorer, DimensionScores, Recommendation};

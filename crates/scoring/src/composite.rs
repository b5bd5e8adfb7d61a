use crate::accumulator::{BASELINE_SCORE, DimensionResult};
use kabu_core::common::Dimension;
use kabu_core::config::ScoreWeights;
use serde::{Deserialize, Serialize};
use std::fmt;

/// # Summary
/// 四个维度的评分结果，缺失维度为 `None`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub valuation: Option<DimensionResult>,
    pub growth: Option<DimensionResult>,
    pub fund_flow: Option<DimensionResult>,
    pub technical: Option<DimensionResult>,
}

impl DimensionScores {
    pub fn get(&self, dimension: Dimension) -> Option<&DimensionResult> {
        match dimension {
            Dimension::Valuation => self.valuation.as_ref(),
            Dimension::Growth => self.growth.as_ref(),
            Dimension::FundFlow => self.fund_flow.as_ref(),
            Dimension::Technical => self.technical.as_ref(),
        }
    }

    /// 按展示顺序遍历存在的维度。
    pub fn present(&self) -> impl Iterator<Item = (Dimension, &DimensionResult)> {
        Dimension::ALL
            .into_iter()
            .filter_map(|d| self.get(d).map(|r| (d, r)))
    }
}

/// # Summary
/// 投资建议档位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    HoldCautious,
    Avoid,
    StrongAvoid,
}

impl Recommendation {
    /// # Summary
    /// 由综合评分映射建议档位。
    ///
    /// # Logic
    /// 自上而下取第一个满足的下界：80、65、50、35，其余为建议回避。
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 80 => Recommendation::StrongBuy,
            s if s >= 65 => Recommendation::Buy,
            s if s >= 50 => Recommendation::HoldCautious,
            s if s >= 35 => Recommendation::Avoid,
            _ => Recommendation::StrongAvoid,
        }
    }

    pub fn marker(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy | Recommendation::Buy => "🟢",
            Recommendation::HoldCautious => "🟡",
            Recommendation::Avoid | Recommendation::StrongAvoid => "🔴",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "强烈推荐买入",
            Recommendation::Buy => "推荐买入",
            Recommendation::HoldCautious => "谨慎持有",
            Recommendation::Avoid => "不建议买入",
            Recommendation::StrongAvoid => "建议回避",
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "多项指标优秀，具备较好的投资价值",
            Recommendation::Buy => "整体表现良好，可择机介入",
            Recommendation::HoldCautious => "表现一般，建议观望或小仓位",
            Recommendation::Avoid => "多项指标偏弱，需要等待更好时机",
            Recommendation::StrongAvoid => "风险较大，不宜介入",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} **{}** - {}", self.marker(), self.label(), self.advice())
    }
}

/// 综合评分结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeResult {
    pub total_score: i32,
    pub recommendation: Recommendation,
}

/// # Summary
/// 加权综合评分器。
///
/// # Invariants
/// - 权重为整数百分比，使用整数运算保证结果可复现。
/// - 缺失维度直接跳过，不重新归一化剩余权重。
#[derive(Debug, Clone, Copy)]
pub struct CompositeScorer {
    weights: ScoreWeights,
}

impl CompositeScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// # Summary
    /// 计算综合评分与建议。
    ///
    /// # Logic
    /// 1. 对存在的维度求 Σ 分数 × 权重%。
    /// 2. 向下取整除以 100；没有任何维度时取基准分 50。
    /// 3. 按分档映射建议。
    pub fn score(&self, scores: &DimensionScores) -> CompositeResult {
        let mut present = scores.present().peekable();
        let total_score = if present.peek().is_none() {
            BASELINE_SCORE
        } else {
            present
                .map(|(d, r)| r.score * self.weights.weight(d))
                .sum::<i32>()
                .div_euclid(100)
        };
        CompositeResult {
            total_score,
            recommendation: Recommendation::from_score(total_score),
        }
    }
}

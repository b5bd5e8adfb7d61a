use serde::{Deserialize, Serialize};

/// 维度评分的基准分。
pub const BASELINE_SCORE: i32 = 50;

/// # Summary
/// 单个维度的评分结果。
///
/// # Invariants
/// - `score` 不做截断，可能超出 [0, 100]。
/// - `signals` 按规则执行顺序记录理由。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionResult {
    pub score: i32,
    pub signals: Vec<String>,
}

impl DimensionResult {
    /// 基准分且无任何理由的结果。
    pub fn baseline() -> Self {
        ScoreAccumulator::baseline().finish()
    }
}

/// # Summary
/// 容错的评分累加器。
///
/// # Invariants
/// - 按值传递：每条规则接收累加器并返回新的累加器，规则之间没有共享可变状态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreAccumulator {
    score: i32,
    signals: Vec<String>,
}

impl ScoreAccumulator {
    pub fn baseline() -> Self {
        Self {
            score: BASELINE_SCORE,
            signals: Vec::new(),
        }
    }

    /// 加减分并记录理由。
    pub fn adjust(mut self, delta: i32, reason: impl Into<String>) -> Self {
        self.score += delta;
        self.signals.push(reason.into());
        self
    }

    /// 只记录理由，不改变分值。
    pub fn note(self, reason: impl Into<String>) -> Self {
        self.adjust(0, reason)
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn finish(self) -> DimensionResult {
        DimensionResult {
            score: self.score,
            signals: self.signals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_keeps_order_and_does_not_clamp() {
        let result = ScoreAccumulator::baseline()
            .adjust(25, "a")
            .note("b")
            .adjust(40, "c")
            .finish();
        assert_eq!(result.score, 115);
        assert_eq!(result.signals, vec!["a", "b", "c"]);
    }
}

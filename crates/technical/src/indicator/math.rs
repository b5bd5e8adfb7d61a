//! 带缺失值语义的滚动窗口与指数平滑工具。
//!
//! 所有函数的输入输出等长；`None` 表示该位置未定义 (历史不足或除零)，绝不以 0 代替。

/// 将长度转换为浮点数，超出 `u32` 范围时饱和。
pub fn as_f64(n: usize) -> f64 {
    u32::try_from(n).map(f64::from).unwrap_or(f64::from(u32::MAX))
}

/// # Summary
/// 通用尾随窗口计算。
///
/// # Logic
/// 1. 下标 `i < period - 1` 时窗口不完整，输出 `None`。
/// 2. 窗口内任一值未定义时输出 `None`。
/// 3. 否则把完整窗口交给 `f` 计算。
fn rolling<F>(values: &[Option<f64>], period: usize, f: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> Option<f64>,
{
    if period == 0 {
        return vec![None; values.len()];
    }
    (0..values.len())
        .map(|i| {
            if i + 1 < period {
                return None;
            }
            let window: Option<Vec<f64>> = values[i + 1 - period..=i].iter().copied().collect();
            window.and_then(|w| f(&w))
        })
        .collect()
}

/// 尾随算术平均。
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| Some(w.iter().sum::<f64>() / as_f64(w.len())))
}

/// 尾随样本标准差 (分母 n-1)，窗口不足 2 个值时未定义。
pub fn rolling_std(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| {
        if w.len() < 2 {
            return None;
        }
        let mean = w.iter().sum::<f64>() / as_f64(w.len());
        let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / as_f64(w.len() - 1);
        Some(var.sqrt())
    })
}

pub fn rolling_min(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().reduce(f64::min))
}

pub fn rolling_max(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling(values, period, |w| w.iter().copied().reduce(f64::max))
}

/// # Summary
/// 指数平滑 `s_t = α·x_t + (1-α)·s_{t-1}`。
///
/// # Invariants
/// - 以第一个已定义的输入作为种子，不做预热。
/// - 未定义的输入产生未定义的输出，且不改变递推状态。
///
/// # Arguments
/// * `values`: 输入列。
/// * `alpha`: 平滑系数，取值 (0, 1]。
pub fn ema(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let mut state: Option<f64> = None;
    values
        .iter()
        .map(|v| {
            let x = (*v)?;
            let next = match state {
                Some(prev) => alpha * x + (1.0 - alpha) * prev,
                None => x,
            };
            state = Some(next);
            Some(next)
        })
        .collect()
}

/// 以跨度表示的指数平滑，`α = 2 / (span + 1)`。
pub fn ema_span(values: &[Option<f64>], span: usize) -> Vec<Option<f64>> {
    ema(values, 2.0 / (as_f64(span) + 1.0))
}

/// 逐元素组合两列，任一侧未定义时结果未定义。
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> Option<f64>,
{
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => f(*x, *y),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defined(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    fn close_to(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_rolling_mean_warmup() {
        let out = rolling_mean(&defined(&[10.0, 12.0, 14.0, 16.0, 18.0]), 3);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert!(close_to(out[2], 12.0));
        assert!(close_to(out[4], 16.0));
    }

    #[test]
    fn test_rolling_requires_full_defined_window() {
        let values = vec![Some(1.0), None, Some(3.0), Some(5.0)];
        let out = rolling_mean(&values, 2);
        assert_eq!(out, vec![None, None, None, Some(4.0)]);
    }

    #[test]
    fn test_rolling_std_is_sample_std() {
        let out = rolling_std(&defined(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 8);
        // 样本方差 32/7
        assert!(close_to(out[7], (32.0_f64 / 7.0).sqrt()));
        assert_eq!(rolling_std(&defined(&[1.0, 2.0]), 1), vec![None, None]);
    }

    #[test]
    fn test_ema_seeds_on_first_defined_and_skips_gaps() {
        let values = vec![None, Some(10.0), None, Some(20.0)];
        let out = ema(&values, 0.5);
        assert_eq!(out, vec![None, Some(10.0), None, Some(15.0)]);
    }

    #[test]
    fn test_as_f64() {
        assert_eq!(as_f64(0), 0.0);
        assert_eq!(as_f64(26), 26.0);
    }
}

use thiserror::Error;

/// # Summary
/// 市场数据域错误枚举，处理网络、解析及数据缺失等问题。
///
/// # Invariants
/// - 任何变体都不会中断一次完整分析：调用方将其视为对应维度的数据缺失。
#[derive(Error, Debug)]
pub enum MarketError {
    // 上游返回空数据或明确表示无数据
    #[error("Data unavailable: {0}")]
    DataUnavailable(String),
    // 网络层错误，包含底层 HTTP 客户端错误信息
    #[error("Network error: {0}")]
    Network(String),
    // 数据解析错误，如 JSON 格式不匹配
    #[error("Parse error: {0}")]
    Parse(String),
    // 请求的证券未找到
    #[error("Data not found")]
    NotFound,
    // K 线序列不满足日期严格递增
    #[error("Invalid series: {0}")]
    InvalidSeries(String),
    // 数据源不提供该类数据
    #[error("Unsupported by provider: {0}")]
    Unsupported(String),
}

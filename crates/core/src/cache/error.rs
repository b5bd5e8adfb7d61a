use thiserror::Error;

/// # Summary
/// 缓存域错误枚举，处理序列化及底层存储故障。
///
/// # Invariants
/// - 缓存错误从不向分析流程传播：调用方记录日志后绕过缓存。
#[derive(Error, Debug)]
pub enum CacheError {
    // 数据序列化失败
    #[error("Serialize error: {0}")]
    Serialize(String),
    // 数据反序列化失败
    #[error("Deserialize error: {0}")]
    Deserialize(String),
    // 底层存储引擎故障 (SQLite 连接、建表、读写)
    #[error("Storage error: {0}")]
    Storage(String),
}

use crate::cache::error::CacheError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// # Summary
/// 缓存统计信息。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    // 条目总数
    pub total: usize,
    // 已过期但尚未清理的条目数
    pub expired: usize,
    // 仍然有效的条目数
    pub valid: usize,
}

/// # Summary
/// 业务无关的带过期时间的异步 KV 存储接口 (Port)。
///
/// # Invariants
/// - 处理原始字节，确保 Trait 是对象安全的 (Object Safe)。
/// - 已过期的条目对读取方不可见。
#[async_trait]
pub trait Cache: Send + Sync {
    /// # Summary
    /// 设置原始字节数据。
    ///
    /// # Logic
    /// 1. 计算过期时刻 = 当前时刻 + `ttl`。
    /// 2. 覆盖写入同名键。
    ///
    /// # Arguments
    /// * `key`: 唯一键。
    /// * `value`: 原始字节数组。
    /// * `ttl`: 存活时长。
    ///
    /// # Returns
    /// 成功返回 Ok，失败返回 `CacheError`。
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    /// # Summary
    /// 获取原始字节数据。
    ///
    /// # Logic
    /// 1. 根据键检索存储内容。
    /// 2. 若条目已过期，删除该条目并视为不存在。
    ///
    /// # Returns
    /// 存在且未过期则返回 `Some(Vec<u8>)`，否则返回 `None`。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// 删除指定键，键不存在时同样返回 Ok。
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// 清理所有过期条目，返回清理数量。
    async fn purge_expired(&self) -> Result<usize, CacheError>;

    /// 清空全部条目。
    async fn clear_all(&self) -> Result<(), CacheError>;

    /// 统计条目数量。
    async fn stats(&self) -> Result<CacheStats, CacheError>;
}

/// # Summary
/// 缓存泛型扩展接口，提供便捷的序列化支持。
///
/// # Invariants
/// - 自动为所有实现 `Cache` 的类型提供支持。
#[async_trait]
pub trait CacheExt: Cache {
    /// # Summary
    /// 存入强类型对象。
    ///
    /// # Logic
    /// 1. 使用 JSON 序列化对象。
    /// 2. 调用底层 `set_raw` 写入。
    async fn set<T: Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialize(e.to_string()))?;
        self.set_raw(key, bytes, ttl).await
    }

    /// # Summary
    /// 取出强类型对象。
    ///
    /// # Logic
    /// 1. 调用底层 `get_raw` 获取字节。
    /// 2. 使用 JSON 反序列化为目标类型。
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, CacheError> {
        match self.get_raw(key).await? {
            Some(bytes) => {
                let val = serde_json::from_slice(&bytes)
                    .map_err(|e| CacheError::Deserialize(e.to_string()))?;
                Ok(Some(val))
            }
            None => Ok(None),
        }
    }
}

impl<T: Cache + ?Sized> CacheExt for T {}

/// # Summary
/// 由数据类别与请求参数生成缓存键。
///
/// # Logic
/// 1. 以 `:` 拼接类别与各参数。
/// 2. 对拼接结果取 SHA-256 并以十六进制输出。
///
/// # Arguments
/// * `category`: 数据类别 (例如 `daily_kline`)。
/// * `parts`: 参与区分的请求参数。
///
/// # Returns
/// 64 位十六进制字符串。
pub fn cache_key(category: &str, parts: &[&str]) -> String {
    let mut raw = String::from(category);
    for part in parts {
        raw.push(':');
        raw.push_str(part);
    }
    hex::encode(Sha256::digest(raw.as_bytes()))
}

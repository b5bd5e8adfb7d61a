use async_trait::async_trait;
use dashmap::DashMap;
use kabu_core::cache::error::CacheError;
use kabu_core::cache::port::{Cache, CacheStats};
use std::time::{Duration, Instant};
use tracing::debug;

/// 缓存条目：数据与过期时刻。
struct Entry {
    value: Vec<u8>,
    // `None` 表示过期时刻超出 `Instant` 的表示范围，视为永不过期
    expire_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expire_at.is_some_and(|at| at <= now)
    }
}

/// # Summary
/// 基于 DashMap 的内存 TTL 缓存实现。
///
/// # Invariants
/// - 所有操作均通过并发哈希表 `DashMap` 执行，保证多线程安全。
/// - 过期条目在读取或清理时惰性删除，不启动后台任务。
pub struct MemCache {
    // 线程安全的 KV 存储容器
    storage: DashMap<String, Entry>,
}

impl MemCache {
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }
}

impl Default for MemCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for MemCache {
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let expire_at = Instant::now().checked_add(ttl);
        self.storage.insert(key.to_string(), Entry { value, expire_at });
        Ok(())
    }

    /// # Summary
    /// 获取原始字节数据。
    ///
    /// # Logic
    /// 1. 读取条目并在持有读锁期间判断是否过期。
    /// 2. 释放读锁后删除过期条目，避免同分片上的死锁。
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        let hit = self
            .storage
            .get(key)
            .map(|e| (!e.is_expired(now)).then(|| e.value.clone()));
        match hit {
            Some(Some(value)) => Ok(Some(value)),
            Some(None) => {
                self.storage.remove_if(key, |_, e| e.is_expired(now));
                debug!(key, "Cache entry expired");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.storage.remove(key);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut purged = 0;
        self.storage.retain(|_, e| {
            let keep = !e.is_expired(now);
            if !keep {
                purged += 1;
            }
            keep
        });
        Ok(purged)
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        self.storage.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = Instant::now();
        let total = self.storage.len();
        let expired = self
            .storage
            .iter()
            .filter(|e| e.value().is_expired(now))
            .count();
        Ok(CacheStats {
            total,
            expired,
            valid: total.saturating_sub(expired),
        })
    }
}

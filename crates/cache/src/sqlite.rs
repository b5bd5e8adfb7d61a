use async_trait::async_trait;
use chrono::Utc;
use kabu_core::cache::error::CacheError;
use kabu_core::cache::port::{Cache, CacheStats};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// # Summary
/// 基于 SQLite 的持久化 TTL 缓存。
///
/// # Invariants
/// - 单表 `cache`，以键为主键，重复写入覆盖旧值。
/// - 过期时刻以 Unix 毫秒存储，`expire_at <= now` 即视为过期。
pub struct SqliteCache {
    pool: SqlitePool,
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn storage_err(e: sqlx::Error) -> CacheError {
    CacheError::Storage(e.to_string())
}

fn to_count(n: i64) -> usize {
    usize::try_from(n).unwrap_or(0)
}

impl SqliteCache {
    /// # Summary
    /// 打开 (或创建) 缓存数据库。
    ///
    /// # Logic
    /// 1. 确保数据库文件的父目录存在。
    /// 2. 开启 `create_if_missing` 建立连接池。
    /// 3. 执行建表 SQL。
    ///
    /// # Arguments
    /// * `path`: 数据库文件路径。
    ///
    /// # Returns
    /// 缓存实例；目录或数据库无法创建时返回 `CacheError::Storage`。
    pub async fn open(path: &Path) -> Result<Self, CacheError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::Storage(e.to_string()))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(storage_err)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                expire_at INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&pool)
        .await
        .map_err(storage_err)?;

        info!(path = %path.display(), "Opened SQLite cache");
        Ok(Self { pool })
    }
}

#[async_trait]
impl Cache for SqliteCache {
    async fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let now = now_millis();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO cache (key, value, expire_at, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now.saturating_add(ttl_ms))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let row = sqlx::query_as::<_, (Vec<u8>, i64)>(
            "SELECT value, expire_at FROM cache WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        match row {
            Some((_, expire_at)) if expire_at <= now_millis() => {
                debug!(key, "Cache entry expired");
                self.del(key).await?;
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value)),
            None => Ok(None),
        }
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM cache WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let result = sqlx::query("DELETE FROM cache WHERE expire_at <= ?")
            .bind(now_millis())
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(usize::try_from(result.rows_affected()).unwrap_or(usize::MAX))
    }

    async fn clear_all(&self) -> Result<(), CacheError> {
        sqlx::query("DELETE FROM cache")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, CacheError> {
        let (total, expired) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(CASE WHEN expire_at <= ? THEN 1 ELSE 0 END), 0)
            FROM cache
            "#,
        )
        .bind(now_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_err)?;

        let (total, expired) = (to_count(total), to_count(expired));
        Ok(CacheStats {
            total,
            expired,
            valid: total.saturating_sub(expired),
        })
    }
}

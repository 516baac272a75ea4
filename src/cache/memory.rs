//! # 进程内缓存后端
//!
//! moka 异步缓存实现：按值字节长度计费的容量预算，逐条目精确 TTL。
//! 淘汰是尽力而为的本地行为，不提供分布式一致性。

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};

use crate::error::Result;

use super::client::{CacheEntry, CacheProvider};

/// 缓存值与其自带的存活时间
#[derive(Debug, Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

/// 逐条目过期策略：以写入时各自携带的 TTL 为准
struct PerEntryExpiry;

impl Expiry<String, CachedValue> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// 进程内缓存后端
pub struct MemoryCache {
    cache: Cache<String, CachedValue>,
}

impl MemoryCache {
    /// 创建新的内存缓存，`max_capacity` 为值字节总量预算
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .weigher(|_key: &String, entry: &CachedValue| {
                u32::try_from(entry.value.len()).unwrap_or(u32::MAX)
            })
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        Self { cache }
    }
}

#[async_trait]
impl CacheProvider for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn bulk_get(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.cache.get(key).await.map(|entry| entry.value));
        }
        Ok(values)
    }

    async fn bulk_set(&self, entries: &[CacheEntry]) -> Result<()> {
        for entry in entries {
            let cached = CachedValue {
                value: entry.value.clone(),
                ttl: entry.ttl,
            };
            self.cache.insert(entry.key.clone(), cached).await;
        }
        // 等待写入和称重结算完成，后续读取立即可见
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}

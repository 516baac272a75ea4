//! # 缓存管理器
//!
//! 面向单个请求的缓存门面：按用户 login 划分命名空间，
//! 通过预取分组把后端读取合并为一次批量往返，写入先进入
//! 待刷缓冲、由一次批量写回落盘。
//!
//! 实例的生命周期与一次请求一致，不跨任务共享，因此不加锁；
//! 并发安全由后端实现负责。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{BadgeError, Result};

use super::client::{CacheEntry, CacheProvider};
use super::keys::{CACHE_KEYS, CacheGroup, CacheKey};

/// 单请求缓存管理器
pub struct CacheManager {
    /// 命名空间标识（用户 login）
    id: String,
    /// 共享的缓存后端
    provider: Arc<dyn CacheProvider>,
    /// 读快照：只由 `prefetch` 填充
    data: HashMap<CacheKey, String>,
    /// 待刷条目，`flush` 时一次性批量写回
    pending: Vec<CacheEntry>,
}

impl CacheManager {
    /// 创建新的缓存管理器，快照与缓冲均为空
    #[must_use]
    pub fn new(provider: Arc<dyn CacheProvider>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider,
            data: HashMap::with_capacity(CACHE_KEYS.len()),
            pending: Vec::new(),
        }
    }

    /// 预取一个分组，把后端命中的值装入读快照
    ///
    /// 多键分组只发出一次批量读取；单键分组直接走单键读取，
    /// 省掉批量命令的开销。缺失的键不会写入快照，读取时与
    /// 从未预取无异。后端失败时快照不做部分更新。
    pub async fn prefetch(&mut self, group: CacheGroup) -> Result<()> {
        let keys = group.keys();
        let cache_keys: Vec<String> = keys.iter().map(|key| key.build(&self.id)).collect();

        if cache_keys.len() > 1 {
            let values = self.provider.bulk_get(&cache_keys).await.map_err(|e| {
                BadgeError::cache_with_source(format!("预取分组 {group} 批量读取失败"), e)
            })?;

            for (key, value) in keys.iter().zip(values) {
                if let Some(value) = value {
                    self.data.insert(*key, value);
                }
            }
        } else {
            let value = self.provider.get(&cache_keys[0]).await.map_err(|e| {
                BadgeError::cache_with_source(format!(
                    "预取分组 {group} 读取键 {} 失败",
                    keys[0]
                ), e)
            })?;

            if let Some(value) = value {
                self.data.insert(keys[0], value);
            }
        }

        Ok(())
    }

    /// 从读快照中查找
    ///
    /// 纯内存查找，绝不触达后端。未预取（或后端缺失）的键返回
    /// `None`，即使后端此刻实际持有该值。
    #[must_use]
    pub fn get(&self, key: CacheKey) -> Option<&str> {
        self.data.get(&key).map(String::as_str)
    }

    /// 按键的默认 TTL 写入待刷缓冲
    ///
    /// 没有默认 TTL 的键（`AccessToken`）拒绝写入，不触达后端。
    pub fn set(&mut self, key: CacheKey, value: impl Into<String>) -> Result<()> {
        let Some(ttl) = key.default_ttl() else {
            return Err(BadgeError::cache(format!("缓存键 {key} 没有默认 TTL")));
        };

        self.set_with_ttl(key, value, ttl);
        Ok(())
    }

    /// 以显式 TTL 写入待刷缓冲
    ///
    /// 契约：写入不更新读快照。同一实例内 `set` 之后立刻 `get`
    /// 同一个键读不到新值，需要读己之写的调用方自行保留局部变量。
    pub fn set_with_ttl(&mut self, key: CacheKey, value: impl Into<String>, ttl: Duration) {
        let entry = CacheEntry {
            key: key.build(&self.id),
            value: value.into(),
            ttl,
        };
        self.pending.push(entry);
    }

    /// 把待刷缓冲一次性批量写回后端
    ///
    /// 缓冲为空时不发出任何后端调用。仅在写回成功后清空缓冲；
    /// 失败时缓冲保留，但本系统的调用方不重试（至多一次交付）。
    pub async fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        self.provider
            .bulk_set(&self.pending)
            .await
            .map_err(|e| BadgeError::cache_with_source("批量写回缓存条目失败", e))?;

        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// 记录调用次数的后端替身
    #[derive(Default)]
    struct MockProvider {
        store: Mutex<HashMap<String, String>>,
        get_calls: AtomicUsize,
        bulk_get_calls: AtomicUsize,
        bulk_set_calls: AtomicUsize,
        last_bulk_set_len: AtomicUsize,
        fail_bulk_set: AtomicBool,
    }

    impl MockProvider {
        fn with_values(values: &[(&str, &str)]) -> Self {
            let provider = Self::default();
            {
                let mut store = provider.store.lock().unwrap();
                for (key, value) in values {
                    store.insert((*key).to_string(), (*value).to_string());
                }
            }
            provider
        }
    }

    #[async_trait]
    impl CacheProvider for MockProvider {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.store.lock().unwrap().get(key).cloned())
        }

        async fn bulk_get(&self, keys: &[String]) -> Result<Vec<Option<String>>> {
            self.bulk_get_calls.fetch_add(1, Ordering::SeqCst);
            let store = self.store.lock().unwrap();
            Ok(keys.iter().map(|key| store.get(key).cloned()).collect())
        }

        async fn bulk_set(&self, entries: &[CacheEntry]) -> Result<()> {
            self.bulk_set_calls.fetch_add(1, Ordering::SeqCst);
            self.last_bulk_set_len.store(entries.len(), Ordering::SeqCst);

            if self.fail_bulk_set.load(Ordering::SeqCst) {
                return Err(BadgeError::cache("模拟的批量写入失败"));
            }

            let mut store = self.store.lock().unwrap();
            for entry in entries {
                store.insert(entry.key.clone(), entry.value.clone());
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_prefetch_multi_key_group_issues_single_bulk_get() {
        let provider = Arc::new(MockProvider::with_values(&[
            ("access-token", "tok"),
            ("avatar:jdoe", "b64img"),
        ]));
        let mut manager = CacheManager::new(provider.clone(), "jdoe");

        manager.prefetch(CacheGroup::Data).await.expect("预取失败");

        assert_eq!(provider.bulk_get_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.get_calls.load(Ordering::SeqCst), 0);

        // 规格场景：AccessToken 命中、User 缺失、Avatar 命中
        assert_eq!(manager.get(CacheKey::AccessToken), Some("tok"));
        assert_eq!(manager.get(CacheKey::User), None);
        assert_eq!(manager.get(CacheKey::Avatar), Some("b64img"));
    }

    #[tokio::test]
    async fn test_prefetch_singleton_group_issues_single_get() {
        let provider = Arc::new(MockProvider::with_values(&[("profile:jdoe", "<svg/>")]));
        let mut manager = CacheManager::new(provider.clone(), "jdoe");

        manager
            .prefetch(CacheGroup::Profile)
            .await
            .expect("预取失败");

        assert_eq!(provider.get_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.bulk_get_calls.load(Ordering::SeqCst), 0);
        assert_eq!(manager.get(CacheKey::Profile), Some("<svg/>"));
    }

    #[tokio::test]
    async fn test_get_without_prefetch_is_none_even_if_backend_has_value() {
        let provider = Arc::new(MockProvider::with_values(&[("profile:jdoe", "<svg/>")]));
        let manager = CacheManager::new(provider.clone(), "jdoe");

        assert_eq!(manager.get(CacheKey::Profile), None);
        assert_eq!(provider.get_calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.bulk_get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_set_without_default_ttl_fails_without_backend_call() {
        let provider = Arc::new(MockProvider::default());
        let mut manager = CacheManager::new(provider.clone(), "jdoe");

        let result = manager.set(CacheKey::AccessToken, "tok");

        assert!(result.is_err(), "AccessToken 没有默认 TTL，set 应失败");
        assert_eq!(provider.bulk_set_calls.load(Ordering::SeqCst), 0);

        // 失败的 set 不应留下待刷条目
        manager.flush().await.expect("flush 失败");
        assert_eq!(provider.bulk_set_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_set_does_not_update_read_snapshot() {
        let provider = Arc::new(MockProvider::default());
        let mut manager = CacheManager::new(provider, "jdoe");

        manager.set(CacheKey::Profile, "<svg/>").expect("set 失败");

        // 写缓冲与读快照解耦：同实例内不提供读己之写
        assert_eq!(manager.get(CacheKey::Profile), None);
    }

    #[tokio::test]
    async fn test_flush_empty_buffer_is_noop() {
        let provider = Arc::new(MockProvider::default());
        let mut manager = CacheManager::new(provider.clone(), "jdoe");

        manager.flush().await.expect("flush 失败");

        assert_eq!(provider.bulk_set_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_flush_sends_all_entries_in_one_bulk_set() {
        let provider = Arc::new(MockProvider::default());
        let mut manager = CacheManager::new(provider.clone(), "jdoe");

        manager.set_with_ttl(CacheKey::AccessToken, "tok", Duration::from_secs(7200));
        manager.set(CacheKey::User, r#"{"name":"jdoe"}"#).expect("set 失败");
        manager.set(CacheKey::Profile, "<svg/>").expect("set 失败");

        manager.flush().await.expect("flush 失败");

        assert_eq!(provider.bulk_set_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.last_bulk_set_len.load(Ordering::SeqCst), 3);

        // 刷新成功后缓冲清空，再次 flush 不再触达后端
        manager.flush().await.expect("flush 失败");
        assert_eq!(provider.bulk_set_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_flush_failure_keeps_pending_entries() {
        let provider = Arc::new(MockProvider::default());
        provider.fail_bulk_set.store(true, Ordering::SeqCst);
        let mut manager = CacheManager::new(provider.clone(), "jdoe");

        manager.set(CacheKey::Profile, "<svg/>").expect("set 失败");
        assert!(manager.flush().await.is_err(), "写回失败应向上传播");

        // 失败后缓冲保留，恢复后重新 flush 会再次携带同样的条目
        provider.fail_bulk_set.store(false, Ordering::SeqCst);
        manager.flush().await.expect("flush 失败");
        assert_eq!(provider.bulk_set_calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.last_bulk_set_len.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_round_trip_through_fresh_manager() {
        let provider = Arc::new(MockProvider::default());

        let mut writer = CacheManager::new(provider.clone(), "jdoe");
        writer.set_with_ttl(CacheKey::Profile, "<svg/>", Duration::from_secs(3600));
        writer.flush().await.expect("flush 失败");

        let mut reader = CacheManager::new(provider, "jdoe");
        reader
            .prefetch(CacheGroup::Profile)
            .await
            .expect("预取失败");
        assert_eq!(reader.get(CacheKey::Profile), Some("<svg/>"));
    }

    #[tokio::test]
    async fn test_namespace_isolation_between_ids() {
        let provider = Arc::new(MockProvider::default());

        let mut alice = CacheManager::new(provider.clone(), "alice");
        alice.set(CacheKey::Profile, "<svg>alice</svg>").expect("set 失败");
        alice.flush().await.expect("flush 失败");

        let mut bob = CacheManager::new(provider, "bob");
        bob.prefetch(CacheGroup::Profile).await.expect("预取失败");
        assert_eq!(bob.get(CacheKey::Profile), None);
    }
}

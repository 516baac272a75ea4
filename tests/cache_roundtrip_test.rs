//! # 缓存模块集成测试
//!
//! 用内存后端验证缓存管理器的完整读写回路

use std::sync::Arc;
use std::time::Duration;

use ftbadge::cache::{CacheGroup, CacheKey, CacheManager, CacheProvider, MemoryCache};

fn memory_provider() -> Arc<dyn CacheProvider> {
    Arc::new(MemoryCache::new(1 << 20))
}

#[tokio::test]
async fn test_round_trip_through_memory_backend() {
    let provider = memory_provider();

    // 写入方：显式 TTL 进入待刷缓冲，flush 落盘
    let mut writer = CacheManager::new(provider.clone(), "jdoe");
    writer.set_with_ttl(CacheKey::Profile, "<svg/>", Duration::from_secs(3600));
    writer.flush().await.expect("flush 失败");

    // 读取方：全新实例必须先预取才能看到值
    let mut reader = CacheManager::new(provider, "jdoe");
    assert_eq!(reader.get(CacheKey::Profile), None);

    reader
        .prefetch(CacheGroup::Profile)
        .await
        .expect("预取失败");
    assert_eq!(reader.get(CacheKey::Profile), Some("<svg/>"));
}

#[tokio::test]
async fn test_data_group_partial_hit_scenario() {
    let provider = memory_provider();

    // 预置：令牌和头像命中，用户资料缺失
    let mut seeder = CacheManager::new(provider.clone(), "jdoe");
    seeder.set_with_ttl(CacheKey::AccessToken, "tok", Duration::from_secs(7200));
    seeder.set_with_ttl(CacheKey::Avatar, "b64img", Duration::from_secs(3600));
    seeder.flush().await.expect("flush 失败");

    let mut manager = CacheManager::new(provider, "jdoe");
    manager.prefetch(CacheGroup::Data).await.expect("预取失败");

    assert_eq!(manager.get(CacheKey::AccessToken), Some("tok"));
    assert_eq!(manager.get(CacheKey::User), None);
    assert_eq!(manager.get(CacheKey::Avatar), Some("b64img"));
}

#[tokio::test]
async fn test_default_ttl_set_round_trip() {
    let provider = memory_provider();

    let mut writer = CacheManager::new(provider.clone(), "jdoe");
    writer
        .set(CacheKey::User, r#"{"name":"jdoe"}"#)
        .expect("set 失败");
    writer.flush().await.expect("flush 失败");

    let mut reader = CacheManager::new(provider, "jdoe");
    reader.prefetch(CacheGroup::Data).await.expect("预取失败");
    assert_eq!(reader.get(CacheKey::User), Some(r#"{"name":"jdoe"}"#));
}

#[tokio::test]
async fn test_flush_with_empty_buffer_is_noop() {
    let provider = memory_provider();

    let mut manager = CacheManager::new(provider, "jdoe");
    manager.flush().await.expect("flush 失败");
    manager.flush().await.expect("重复 flush 失败");
}
